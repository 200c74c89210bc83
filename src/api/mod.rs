pub mod http;

pub use http::{
    get_current_block, get_transactions, router, subscribe, ApiError, ApiServer, AppState,
    CurrentBlockResponse, ErrorResponse, SubscribeResponse, TransactionsResponse,
};
