//! User directory and invitations.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/users/me` | Caller's resolved record |
//! | GET | `/api/admin/users` | List users (admin) |
//! | POST | `/api/admin/users/invitations` | Invite by email and role (admin) |
//! | DELETE | `/api/admin/users/{email}` | Remove every record for an email (admin) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
