/// Hierarchical address and pattern module
///
/// Provides the concrete [`Address`] routing key and the wildcard-capable
/// [`AddressPattern`] used to bind role sets to ranges of addresses.
///
/// # Examples
///
/// ```
/// use corvomq_security::address::{Address, AddressPattern};
///
/// let address = Address::new("orders.widgets").unwrap();
/// let pattern = AddressPattern::new("orders.#").unwrap();
///
/// assert!(pattern.matches(&address));
/// ```
mod types;

pub use types::{Address, AddressError, AddressPattern, AddressResult};
pub use types::{ANY_WORDS, SEPARATOR, SINGLE_WORD};
