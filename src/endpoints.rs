//! The API endpoints URIs.

/// The root route which serves the web client's `index.html`.
pub const ROOT: &str = "/";
/// The route for the web client's static files.
pub const CLIENT: &str = "/client";

/// The route for checking that the server is up.
pub const HEALTH: &str = "/api/health";
/// The route for listing the users that have documents.
pub const USERS: &str = "/api/users";
/// The route for logging in by name.
pub const LOG_IN: &str = "/api/login";
/// The route for forgetting the logged in user.
pub const LOG_OUT: &str = "/api/logout";
/// The route for getting every document of the current user in one request.
pub const BOOTSTRAP: &str = "/api/bootstrap";
/// The route to access the user's categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to access the staged transactions.
pub const CURRENT_MONTH: &str = "/api/current-month";
/// The route to discard the staged transactions.
pub const CURRENT_MONTH_RESET: &str = "/api/current-month/reset";
/// The route to access the committed history.
pub const PAST_DATA: &str = "/api/past-data";
/// The route to commit transactions to the history.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access the user's settings.
pub const SETTINGS: &str = "/api/settings";
/// The route to replace documents in bulk.
pub const IMPORT: &str = "/api/import";
/// The route to empty the categories, staging area and history.
pub const CLEAR_ALL: &str = "/api/clear-all";

/// The route for the unified statistics.
pub const STATS: &str = "/api/stats";
/// The route for the legacy mean/min/max summary.
pub const STATS_SUMMARY: &str = "/api/stats/summary";
/// The route for the legacy per-tag means.
pub const STATS_TAG_MEANS: &str = "/api/stats/tag-means";
/// The route for the legacy last three tags of a category.
pub const STATS_CATEGORY_LAST3: &str = "/api/stats/category-last3";
/// The route for the legacy income breakdown.
pub const STATS_INCOME_MEANS: &str = "/api/stats/income-means";
/// The route for the legacy (year, tag) rollup table.
pub const STATS_ROLLUP: &str = "/api/stats/rollup";
