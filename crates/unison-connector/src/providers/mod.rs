//! Per-provider object mappers.
//!
//! | provider   | engagement | contact | company |
//! |------------|------------|---------|---------|
//! | hubspot    | yes        | yes     | yes     |
//! | zoho       | yes        |         | yes     |
//! | pipedrive  | yes        | yes     |         |
//! | zendesk    | yes        | yes     |         |
//! | freshsales |            |         |         |

pub mod hubspot;
pub mod pipedrive;
pub mod zendesk;
pub mod zoho;
