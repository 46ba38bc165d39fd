pub mod service;

pub use service::BoomerGrpcService;

// Include generated proto code
pub mod proto {
    tonic::include_proto!("boomer.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("boomer_descriptor");
}
