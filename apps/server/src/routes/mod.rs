//! HTTP route registration.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  booking   public booking site: catalog, availability, booking         │
//! │  admin     dashboard: appointments, staff, catalog, cash, settings     │
//! │  checkout  the finalize saga                                           │
//! │  reports   revenue summary and commission statements                   │
//! │  events    SSE feed of appointment changes                             │
//! │  billing   subscription webhook and status                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use actix_web::web;

pub mod admin;
pub mod billing;
pub mod booking;
pub mod checkout;
pub mod events;
pub mod reports;

pub fn configure(cfg: &mut web::ServiceConfig) {
    booking::configure(cfg);
    admin::configure(cfg);
    checkout::configure(cfg);
    reports::configure(cfg);
    events::configure(cfg);
    billing::configure(cfg);
}
