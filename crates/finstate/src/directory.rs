//! Corporate directory lookup.
//!
//! A [`CorpDirectory`] is loaded once from a [`DirectoryProvider`] and kept in a
//! caller-owned [`DirectoryCache`], so later loads skip the bulk download.

use finstate_core::{Company, CorpEntry, DataError, DirectoryCache, DirectoryProvider, Result};
use tracing::{debug, info, warn};

/// Separator between name and ticker in a selection name.
const SELECTION_SEPARATOR: &str = " : ";

/// The registered companies known to a filing system.
#[derive(Clone, Debug, Default)]
pub struct CorpDirectory {
    entries: Vec<CorpEntry>,
}

impl CorpDirectory {
    /// Creates a directory from already fetched entries.
    #[must_use]
    pub fn from_entries(entries: Vec<CorpEntry>) -> Self {
        Self { entries }
    }

    /// Loads the directory, consulting `cache` before `provider`.
    ///
    /// Entries are cached under the provider's name. A failing cache is logged
    /// and bypassed.
    ///
    /// # Errors
    /// Returns the provider's error if the directory has to be fetched and the
    /// fetch fails.
    pub async fn load(provider: &dyn DirectoryProvider, cache: &dyn DirectoryCache) -> Result<Self> {
        let key = provider.name();

        match cache.get_directory(key).await {
            Ok(Some(entries)) => {
                debug!(provider = key, entries = entries.len(), "Directory cache hit");
                return Ok(Self::from_entries(entries));
            }
            Ok(None) => debug!(provider = key, "Directory cache miss"),
            Err(e) => warn!(provider = key, error = %e, "Directory cache unavailable"),
        }

        let entries = provider.corporate_directory().await?;
        info!(provider = key, entries = entries.len(), "Fetched corporate directory");

        if let Err(e) = cache.put_directory(key, &entries).await {
            warn!(provider = key, error = %e, "Failed to cache corporate directory");
        }
        Ok(Self::from_entries(entries))
    }

    /// Returns the number of entries, listed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the directory has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn listed(&self) -> impl Iterator<Item = Company> + '_ {
        self.entries.iter().filter_map(CorpEntry::to_company)
    }

    /// Resolves a listed company.
    ///
    /// Accepts a selection name (`"삼성전자 : 005930"`), which resolves by its
    /// ticker, or a bare ticker or exact company name.
    ///
    /// # Errors
    /// Returns [`DataError::InvalidParameter`] for empty input and
    /// [`DataError::CompanyNotFound`] if no listed company matches.
    pub fn resolve(&self, selection: &str) -> Result<Company> {
        let selection = selection.trim();
        if selection.is_empty() {
            return Err(DataError::InvalidParameter(
                "Company selection must not be empty".to_string(),
            ));
        }

        let found = match selection.rsplit_once(SELECTION_SEPARATOR) {
            Some((name, ticker)) => {
                let ticker = ticker.trim();
                let company = self.listed().find(|c| c.ticker.as_str() == ticker);
                if let Some(company) = &company {
                    if company.name != name.trim() {
                        debug!(selection, registered = %company.name, "Name differs from registered name");
                    }
                }
                company
            }
            None => self
                .listed()
                .find(|c| c.ticker.as_str() == selection || c.name == selection),
        };

        found.ok_or_else(|| DataError::CompanyNotFound(selection.to_string()))
    }

    /// Returns `"Name : Ticker"` for every listed company, sorted.
    #[must_use]
    pub fn selection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listed().map(|c| c.to_string()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FakeDirectory;
    use finstate_cache::InMemoryCache;

    fn directory() -> FakeDirectory {
        FakeDirectory::default()
            .with_entry("00126380", "삼성전자", Some("005930"))
            .with_entry("00164779", "SK하이닉스", Some("000660"))
            .with_entry("00434003", "다코", None)
    }

    #[tokio::test]
    async fn test_load_uses_cache() {
        let provider = directory();
        let cache = InMemoryCache::new();

        let first = CorpDirectory::load(&provider, &cache).await.unwrap();
        let second = CorpDirectory::load(&provider, &cache).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_selection_name() {
        let dir = CorpDirectory::load(&directory(), &InMemoryCache::new())
            .await
            .unwrap();

        let company = dir.resolve("삼성전자 : 005930").unwrap();
        assert_eq!(company.corp_code, "00126380");
        assert_eq!(company.ticker.as_str(), "005930");
        assert_eq!(company.name, "삼성전자");
    }

    #[test]
    fn test_resolve_bare_ticker_or_name() {
        let dir = CorpDirectory::from_entries(directory().entries);

        assert_eq!(dir.resolve("000660").unwrap().corp_code, "00164779");
        assert_eq!(dir.resolve("SK하이닉스").unwrap().ticker.as_str(), "000660");
    }

    #[test]
    fn test_resolve_failures() {
        let dir = CorpDirectory::from_entries(directory().entries);

        assert!(matches!(dir.resolve("  "), Err(DataError::InvalidParameter(_))));
        assert!(matches!(
            dir.resolve("없는회사 : 999999"),
            Err(DataError::CompanyNotFound(_))
        ));
        // Unlisted companies cannot be resolved.
        assert!(matches!(dir.resolve("다코"), Err(DataError::CompanyNotFound(_))));
    }

    #[test]
    fn test_selection_names() {
        let dir = CorpDirectory::from_entries(directory().entries);
        assert_eq!(
            dir.selection_names(),
            ["SK하이닉스 : 000660", "삼성전자 : 005930"]
        );
    }

    #[test]
    fn test_selection_names_round_trip() {
        let dir = CorpDirectory::from_entries(directory().entries);
        for name in dir.selection_names() {
            assert_eq!(dir.resolve(&name).unwrap().to_string(), name);
        }
    }
}
