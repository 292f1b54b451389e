pub mod quota_writer;
pub mod request_reader;
pub mod transaction_writer;
