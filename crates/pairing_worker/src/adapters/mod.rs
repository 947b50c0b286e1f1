pub mod object_store;
pub mod queue;
pub mod s3;
pub mod sqs;
