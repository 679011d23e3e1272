pub mod deployment;
pub mod response;

pub use deployment::{ContainerImage, DeploymentInfo, DeploymentSnapshot};
pub use response::{ErrorDetail, ErrorEnvelope};
