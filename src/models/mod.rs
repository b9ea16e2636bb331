// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Coordinates, Location, MenuItem, NewOrder, NewOrderItem, Order, OrderLineItem, OrderStatus,
    PaymentMethod, Product, ProductCategory, RankedRestaurant, Ranking, ResolvedLocations,
    Restaurant,
};
pub use requests::{ListOrdersQuery, OrderProductPayload, RegisterOrderRequest};
pub use responses::{
    BannerResponse, ErrorResponse, HealthResponse, ListOrdersResponse, OrderDispatchResponse,
    ProductResponse, RegisterOrderResponse,
};
