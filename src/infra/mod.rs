pub mod mock_gateway;
pub mod postgres;
pub mod stripe_gateway;
