//! # Device Session Client
//!
//! Opens, drives and closes TWAIN Local sessions against one scanner,
//! capturing every command as an [`Exchange`].

mod exchange;
mod state;
mod twainlocal;

#[cfg(test)]
pub mod fake;

pub use exchange::Exchange;
pub use state::SessionState;
pub use twainlocal::{TwainLocalClient, TwainLocalOptions};

use crate::device::DeviceInfo;

/// Commands the certification engine and console issue against a scanner.
///
/// Every call fills `exchange` with whatever evidence is available and
/// returns `false` when no reply came back. Callers never get an error
/// value: a failed transport still leaves a (partial) exchange behind.
#[allow(async_fn_in_trait)]
pub trait SessionClient {
    async fn info(&mut self, device: &DeviceInfo, exchange: &mut Exchange) -> bool;
    async fn create_session(&mut self, device: &DeviceInfo, exchange: &mut Exchange) -> bool;
    async fn get_session(&mut self, exchange: &mut Exchange) -> bool;
    async fn send_task(&mut self, task: &str, exchange: &mut Exchange) -> bool;
    async fn start_capturing(&mut self, exchange: &mut Exchange) -> bool;
    async fn stop_capturing(&mut self, exchange: &mut Exchange) -> bool;
    /// Release image blocks `first..=last` held by the scanner.
    async fn release_image_blocks(&mut self, first: u64, last: u64, exchange: &mut Exchange) -> bool;
    async fn close_session(&mut self, exchange: &mut Exchange) -> bool;
    fn state(&self) -> SessionState;
}
