fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Client stubs only
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["../proto/boomer/v1/boomer.proto"], &["../proto"])?;

    println!("cargo:rerun-if-changed=../proto/boomer/v1/boomer.proto");

    Ok(())
}
