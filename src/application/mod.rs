// Application layer - use cases over the repository and insight seams
pub mod dashboard_service;
pub mod insight_provider;
pub mod registry_service;
pub mod settings_service;
pub mod sheet_repository;

#[cfg(test)]
pub mod test_support;
