pub mod birth_service;
pub mod collection_service;
pub mod currency_service;
pub mod pair_service;
