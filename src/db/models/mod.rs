//! Database models

pub mod category;
pub mod order;
pub mod product;
pub mod serde_helpers;
pub mod user;

pub use category::{CATEGORY_TABLE, Category, CategoryCreate, CategoryUpdate};
pub use order::{
    Customer, ORDER_TABLE, Order, OrderItem, OrderStatus, ShippingAddress,
};
pub use product::{
    PRODUCT_TABLE, Product, ProductCreate, ProductImage, ProductStatus, ProductUpdate, Rating,
};
pub use user::{Role, USER_TABLE, User, UserPublic};
