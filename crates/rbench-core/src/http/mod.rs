pub mod client;
pub mod dispatcher;

pub use client::HttpClientBuilder;
pub use dispatcher::{error_label, status_label, Dispatcher, RequestDispatcher, REQUEST_ID_HEADER};
