//! Per-host aggregation of video occurrences
//!
//! Folds a host's occurrences into one row per article plus four statistics
//! per platform. The same view feeds the feature pass and the labeling
//! session, so it stays host-scoped and keeps every platform, present or not.

use std::collections::{HashMap, HashSet};

use sqlx::SqlitePool;

use crate::db::occurrences::{fetch_article_count, fetch_occurrences, Occurrence};
use crate::platform::Platform;
use crate::Result;

/// `std_dev` value for a platform with no articles on the host
///
/// Distinguishes "no data" from "zero variance".
pub const STD_DEV_ABSENT: f64 = -1.0;

/// Statistics for one platform on one host
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformStats {
    /// Occurrences per article, one entry per article with at least one
    pub per_article_counts: Vec<u32>,
    /// Total occurrences
    pub sum: u64,
    /// Distinct video identifiers
    pub sum_distinct: u64,
    /// Articles with at least one occurrence
    pub count: u64,
    /// Population standard deviation of `per_article_counts`, or
    /// [`STD_DEV_ABSENT`]
    pub std_dev: f64,
}

impl PlatformStats {
    fn from_counts(per_article_counts: Vec<u32>, sum_distinct: u64) -> Self {
        let sum = per_article_counts.iter().map(|&c| u64::from(c)).sum();
        let count = per_article_counts.len() as u64;
        let std_dev = population_std_dev(&per_article_counts);
        Self {
            per_article_counts,
            sum,
            sum_distinct,
            count,
            std_dev,
        }
    }

    pub fn is_present(&self) -> bool {
        self.count > 0
    }
}

/// Occurrence counts of one article, indexed by [`Platform::index`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRow {
    pub url: String,
    pub counts: [u32; 3],
}

impl ArticleRow {
    pub fn count(&self, platform: Platform) -> u32 {
        self.counts[platform.index()]
    }
}

/// Aggregated view of one host
#[derive(Debug, Clone, PartialEq)]
pub struct HostAggregate {
    pub hostname: String,
    /// Articles crawled for the host, with or without video
    pub article_count: u64,
    /// Articles with at least one occurrence, in first-seen order
    pub articles: Vec<ArticleRow>,
    stats: [PlatformStats; 3],
}

impl HostAggregate {
    pub fn stats(&self, platform: Platform) -> &PlatformStats {
        &self.stats[platform.index()]
    }

    pub fn is_present(&self, platform: Platform) -> bool {
        self.stats(platform).is_present()
    }

    /// Platforms with at least one occurrence, in display order
    pub fn present_platforms(&self) -> Vec<Platform> {
        Platform::ALL.into_iter().filter(|&p| self.is_present(p)).collect()
    }

    /// True when the host has no occurrence on any platform
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Aggregate a host's occurrences
///
/// Articles are grouped by URL, distinct videos by identifier string
/// equality, separately per platform.
pub fn aggregate(hostname: &str, occurrences: &[Occurrence], article_count: u64) -> HostAggregate {
    let mut articles: Vec<ArticleRow> = Vec::new();
    let mut article_index: HashMap<&str, usize> = HashMap::new();
    let mut distinct_videos: [HashSet<&str>; 3] = Default::default();

    for occurrence in occurrences {
        let slot = *article_index
            .entry(occurrence.article_url.as_str())
            .or_insert_with(|| {
                articles.push(ArticleRow {
                    url: occurrence.article_url.clone(),
                    counts: [0; 3],
                });
                articles.len() - 1
            });
        let p = occurrence.platform.index();
        articles[slot].counts[p] += 1;
        distinct_videos[p].insert(occurrence.video_url.as_str());
    }

    let stats = Platform::ALL.map(|platform| {
        let p = platform.index();
        let per_article: Vec<u32> = articles
            .iter()
            .map(|a| a.counts[p])
            .filter(|&c| c > 0)
            .collect();
        PlatformStats::from_counts(per_article, distinct_videos[p].len() as u64)
    });

    HostAggregate {
        hostname: hostname.to_string(),
        article_count,
        articles,
        stats,
    }
}

/// Read a host's occurrences and article count, then aggregate
pub async fn load_host_aggregate(pool: &SqlitePool, hostname: &str) -> Result<HostAggregate> {
    let occurrences = fetch_occurrences(pool, hostname).await?;
    let article_count = fetch_article_count(pool, hostname).await?;
    Ok(aggregate(hostname, &occurrences, article_count))
}

/// Population standard deviation (divides by n), two-pass
///
/// Returns [`STD_DEV_ABSENT`] for an empty slice.
pub fn population_std_dev(values: &[u32]) -> f64 {
    if values.is_empty() {
        return STD_DEV_ABSENT;
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(article: &str, platform: Platform, video: &str) -> Occurrence {
        Occurrence::new(article, platform, video)
    }

    #[test]
    fn test_reference_host() {
        let occurrences = vec![
            occ("art1", Platform::Youtube, "v1"),
            occ("art1", Platform::Youtube, "v2"),
            occ("art2", Platform::Youtube, "v1"),
        ];
        let agg = aggregate("example.com", &occurrences, 5);

        let youtube = agg.stats(Platform::Youtube);
        assert_eq!(youtube.count, 2);
        assert_eq!(youtube.sum, 3);
        assert_eq!(youtube.sum_distinct, 2);
        assert_eq!(youtube.std_dev, 0.5);

        let twitter = agg.stats(Platform::Twitter);
        assert_eq!(twitter.count, 0);
        assert_eq!(twitter.std_dev, STD_DEV_ABSENT);

        assert_eq!(agg.article_count, 5);
        assert_eq!(agg.present_platforms(), vec![Platform::Youtube]);
    }

    #[test]
    fn test_absent_platforms_use_sentinel() {
        let agg = aggregate("empty.example", &[], 3);

        assert!(agg.is_empty());
        for platform in Platform::ALL {
            let stats = agg.stats(platform);
            assert_eq!(stats.std_dev, -1.0);
            assert_eq!(stats.count, 0);
            assert_eq!(stats.sum, 0);
            assert_eq!(stats.sum_distinct, 0);
            assert!(stats.per_article_counts.is_empty());
        }
        assert!(agg.present_platforms().is_empty());
    }

    #[test]
    fn test_single_article_has_zero_variance() {
        let agg = aggregate("one.example", &[occ("a", Platform::Twitter, "t1")], 1);
        assert_eq!(agg.stats(Platform::Twitter).std_dev, 0.0);
    }

    #[test]
    fn test_articles_grouped_across_platforms() {
        let occurrences = vec![
            occ("a", Platform::Twitter, "t1"),
            occ("b", Platform::Facebook, "f1"),
            occ("a", Platform::Youtube, "y1"),
            occ("a", Platform::Twitter, "t2"),
        ];
        let agg = aggregate("mixed.example", &occurrences, 10);

        assert_eq!(agg.articles.len(), 2);
        assert_eq!(agg.articles[0].url, "a");
        assert_eq!(agg.articles[0].counts, [2, 0, 1]);
        assert_eq!(agg.articles[1].url, "b");
        assert_eq!(agg.articles[1].counts, [0, 1, 0]);

        // Article "b" has no twitter videos and must not enter the twitter statistics
        assert_eq!(agg.stats(Platform::Twitter).per_article_counts, vec![2]);
        assert_eq!(agg.stats(Platform::Facebook).per_article_counts, vec![1]);
        assert_eq!(agg.stats(Platform::Youtube).count, 1);
    }

    #[test]
    fn test_distinct_videos_never_exceed_sum() {
        let occurrences = vec![
            occ("a", Platform::Youtube, "v1"),
            occ("b", Platform::Youtube, "v1"),
            occ("c", Platform::Youtube, "v1"),
            occ("c", Platform::Youtube, "v2"),
            occ("a", Platform::Facebook, "v1"),
        ];
        let agg = aggregate("dup.example", &occurrences, 3);

        for platform in Platform::ALL {
            let stats = agg.stats(platform);
            assert!(stats.sum_distinct <= stats.sum);
            assert_eq!(stats.sum, stats.per_article_counts.iter().map(|&c| u64::from(c)).sum::<u64>());
            assert_eq!(stats.count, stats.per_article_counts.len() as u64);
        }
        assert_eq!(agg.stats(Platform::Youtube).sum_distinct, 2);
        // Same identifier on another platform is counted separately
        assert_eq!(agg.stats(Platform::Facebook).sum_distinct, 1);
    }

    #[test]
    fn test_std_dev_is_order_independent() {
        assert_eq!(population_std_dev(&[1, 2, 3, 4]), population_std_dev(&[4, 2, 3, 1]));
        let sd = population_std_dev(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert!((sd - 2.0).abs() < 1e-12);
    }
}
