pub mod chart_service;
pub mod search_service;
pub mod stock_service;
pub mod trending_service;
pub mod watchlist_service;
