//! 基础设施层：只持有稀缺资源，暴露能力

pub mod http_transport;

pub use http_transport::HttpTransport;
