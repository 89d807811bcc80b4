//! Client implementations.

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "arm")]
pub mod arm;

/// Registers all compiled clients with the factory.
///
/// This should be called automatically when the library is used,
/// but can also be called explicitly if needed.
pub fn register_all() {
    #[cfg(feature = "mock")]
    mock::register();

    #[cfg(feature = "arm")]
    arm::register();
}
