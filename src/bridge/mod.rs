//! Transport bridge - synchronous call/response channel
//!
//! The bridge moves an encoded call message to the host and returns the
//! host's integer result. It also owns pointer translation between the two
//! address spaces.

mod space;

pub use space::{AddressSpace, IdentitySpace, OffsetSpace};

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::host::Dispatcher;
use parking_lot::Mutex;
use std::sync::Arc;

/// Synchronous message channel from guest to host
///
/// `invoke` blocks until the host has run the call. Implementations used
/// from several threads must either be safe for concurrent calls or be
/// wrapped in [`SerializedBridge`].
pub trait Transport: Send + Sync {
    fn invoke(&self, message: &[u8]) -> Result<i64, BridgeError>;

    fn address_space(&self) -> &dyn AddressSpace;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    #[inline]
    fn invoke(&self, message: &[u8]) -> Result<i64, BridgeError> {
        (**self).invoke(message)
    }

    #[inline]
    fn address_space(&self) -> &dyn AddressSpace {
        (**self).address_space()
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    #[inline]
    fn invoke(&self, message: &[u8]) -> Result<i64, BridgeError> {
        (**self).invoke(message)
    }

    #[inline]
    fn address_space(&self) -> &dyn AddressSpace {
        (**self).address_space()
    }
}

/// In-process loopback: the host dispatcher runs on the calling thread
#[derive(Debug)]
pub struct LocalBridge {
    dispatcher: Dispatcher,
}

impl LocalBridge {
    #[inline]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Shared address space, streams from the default configuration
    pub fn identity() -> Self {
        Self::from_config(&BridgeConfig::default(), Arc::new(IdentitySpace))
    }

    pub fn from_config(config: &BridgeConfig, space: Arc<dyn AddressSpace>) -> Self {
        Self::new(Dispatcher::from_config(config, space))
    }

    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Transport for LocalBridge {
    fn invoke(&self, message: &[u8]) -> Result<i64, BridgeError> {
        self.dispatcher.dispatch(message)
    }

    fn address_space(&self) -> &dyn AddressSpace {
        self.dispatcher.address_space()
    }
}

/// Serializes calls through a transport that tolerates one caller at a time
#[derive(Debug)]
pub struct SerializedBridge<T> {
    inner: T,
    lock: Mutex<()>,
}

impl<T: Transport> SerializedBridge<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    #[inline]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for SerializedBridge<T> {
    fn invoke(&self, message: &[u8]) -> Result<i64, BridgeError> {
        let _guard = self.lock.lock();
        self.inner.invoke(message)
    }

    fn address_space(&self) -> &dyn AddressSpace {
        self.inner.address_space()
    }
}
