//! Select IR
//!
//! A backend-polymorphic tree describing one select: its fields, the
//! relationships it follows (local and remote), ordering, aggregation, Relay
//! pagination and streaming cursors.
//!
//! Every type is generic over the backend `B`, the remote payload `R` and the
//! leaf value `V`. Passes narrow `R` and `V` through [fold::Walk] and
//! [traverse::Bitraverse].

mod aggregate;
mod bool_exp;
mod column;
mod connection;
pub mod fold;
mod function;
pub mod generic;
mod names;
mod order_by;
mod relationship;
mod remote;
mod select;
mod stream;
pub mod traverse;
mod value;

pub use aggregate::*;
pub use bool_exp::*;
pub use column::*;
pub use connection::*;
pub use fold::{Monoid, Visitor, Walk};
pub use function::*;
pub use generic::{NonEmpty, NullsOrder, OrderByItem, OrderDirection};
pub use names::*;
pub use order_by::*;
pub use relationship::*;
pub use remote::*;
pub use select::*;
pub use stream::*;
pub use traverse::Bitraverse;
pub use value::*;
