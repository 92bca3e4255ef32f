// Env values used to configure the storage account.
pub const MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME: &str = "MIKROSERVICE_AZURE_STORAGE_ACCOUNT_NAME";
pub const MIKROSERVICE_AZURE_STORAGE_SECRET_KEY: &str = "MIKROSERVICE_AZURE_STORAGE_SECRET_KEY";
pub const MIKROSERVICE_AZURE_STORAGE_ENDPOINT: &str = "MIKROSERVICE_AZURE_STORAGE_ENDPOINT";

// Headers used in azure services.
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";
pub const X_MS_ERROR_CODE: &str = "x-ms-error-code";

/// REST version sent with every call and baked into signatures as `sv`.
pub const AZURE_STORAGE_VERSION: &str = "2022-11-02";

/// Signed resource `b`: a single blob.
pub const SAS_RESOURCE_BLOB: &str = "b";
/// Signed protocol: refuse plain http.
pub const SAS_PROTOCOL_HTTPS: &str = "https";
