use fractic_server_error::{define_client_error, define_internal_error};

// Configuration-related.
define_client_error!(MissingConfig, "Missing required environment variable: {name}.", { name: &str });
define_client_error!(
    InvalidConfig,
    "Invalid value for environment variable {name}: '{value}'.",
    { name: &str, value: &str }
);

// Parsing-related.
define_client_error!(InvalidIsoDate, "Invalid ISO date: {date}.", { date: &str });
define_client_error!(InvalidLedgerAmount, "Invalid ledger amount: '{value}'.", { value: &str });
define_client_error!(InvalidEntryKind, "Invalid entry kind: '{value}'.", { value: &str });
define_client_error!(
    IncompleteIntent,
    "'{action}' intent is missing required field '{field}'.",
    { action: &str, field: &str }
);

// Store-related.
define_internal_error!(
    StoreQueryFailed,
    "Ledger store query failed during '{operation}'.",
    { operation: &str }
);
define_internal_error!(StoreConnectionFailed, "Could not connect to the ledger store.");
define_internal_error!(
    StoreSubscriptionFailed,
    "Could not subscribe to store channel '{channel}'.",
    { channel: &str }
);
define_internal_error!(
    InvalidStoreRow,
    "Ledger store returned an invalid row: {details}.",
    { details: &str }
);

// Oracle-related.
define_internal_error!(OracleRequestFailed, "Extraction oracle request failed.");
define_internal_error!(
    OracleResponseInvalid,
    "Extraction oracle returned an unexpected response: {details}.",
    { details: &str }
);

// Transport-related.
define_internal_error!(
    TransportRequestFailed,
    "Messaging transport request to '{endpoint}' failed.",
    { endpoint: &str }
);
define_internal_error!(
    TransportResponseInvalid,
    "Messaging transport returned an unexpected response from '{endpoint}'.",
    { endpoint: &str }
);

// Serving-related.
define_internal_error!(HttpBindFailed, "Could not bind HTTP listener on '{addr}'.", { addr: &str });
define_internal_error!(HttpServeFailed, "HTTP server terminated unexpectedly.");
