// Crate-internal.
// ---

pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod gemini_datasource;
        pub(crate) mod postgres_datasource;
        pub(crate) mod wppconnect_datasource;
    }
    pub(crate) mod models {
        pub(crate) mod amount_model;
        pub(crate) mod intent_model;
        pub(crate) mod iso_date_model;
        pub(crate) mod ledger_entry_model;
        pub(crate) mod profile_model;
        pub(crate) mod wppconnect_model;
    }
    pub(crate) mod repositories {
        pub(crate) mod chat_repository_impl;
        pub(crate) mod extraction_repository_impl;
        pub(crate) mod ledger_repository_impl;
    }
}

pub(crate) mod domain {
    pub(crate) mod entities {
        pub(crate) mod account;
        pub(crate) mod inbound_message;
        pub(crate) mod ledger_entry;
        pub(crate) mod outcome;
        pub(crate) mod transaction_intent;
    }
    pub(crate) mod logic {
        pub(crate) mod auth_relay;
        pub(crate) mod category_normalizer;
        pub(crate) mod channel_address;
        pub(crate) mod command_dispatcher;
        pub(crate) mod identity_resolver;
        pub(crate) mod phone_normalizer;
        pub(crate) mod reconciler;
        pub(crate) mod utils;
    }
    pub(crate) mod repositories {
        pub(crate) mod chat_repository;
        pub(crate) mod extraction_repository;
        pub(crate) mod ledger_repository;
    }
    pub(crate) mod usecases {
        pub(crate) mod handle_message_usecase;
    }
}

pub(crate) mod presentation {
    pub(crate) mod reply_fmt;
    pub(crate) mod utils;
    pub(crate) mod webhook_server;
}

#[cfg(test)]
pub(crate) mod test_support;

// Public exports.
// ---

#[doc(hidden)]
#[allow(unused_imports)]
pub mod exports {
    // This mod represents how clients see the library, and can differ from the
    // internal structure.
    //
    // The contents of this mod are re-exported in the root of the crate.

    pub mod entities {
        pub use crate::domain::entities::account::*;
        pub use crate::domain::entities::inbound_message::*;
        pub use crate::domain::entities::ledger_entry::*;
        pub use crate::domain::entities::outcome::*;
        pub use crate::domain::entities::transaction_intent::*;
    }
}
