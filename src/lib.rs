//! Shared record sync for weighing stations.
//!
//! Stations record weighing tickets, customers, vehicles and products while
//! offline, then exchange them with one shared store. Pulls return everything
//! changed since a cursor; pushes merge records under last-write-wins.

pub mod config;
pub mod db;
pub mod models;
pub mod server;
pub mod sync;
