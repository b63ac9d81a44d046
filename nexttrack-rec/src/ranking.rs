//! Candidate filtering and ranking heuristics
//!
//! MusicBrainz search results are noisy: bootlegs, live tapings,
//! interview discs and alternate mixes all come back alongside the
//! canonical recordings. These filters keep only recordings a
//! recommendation card should show, and the ranking orders them by
//! search relevance with release date as the tie-breaker.

use crate::services::musicbrainz_client::{MbRecording, MbTag};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing parenthesized/bracketed qualifier marking an alternate cut
static ALT_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s*[(\[].*?(?:″|b-side|remix|re-edit|mix|extended).*?[)\]]\s*$"#).unwrap()
});

/// Recordings with no parseable date sort after everything else
static FAR_FUTURE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());

/// Number of tags shown per artist
const TOP_TAG_COUNT: usize = 3;

/// At least one release with status "Official"
pub fn has_official_release(recording: &MbRecording) -> bool {
    recording
        .releases
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|release| release.status.as_deref() == Some("Official"))
}

/// Disambiguation mentions a live taping
pub fn is_live(recording: &MbRecording) -> bool {
    recording
        .disambiguation
        .as_deref()
        .map(|d| d.to_lowercase().contains("live"))
        .unwrap_or(false)
}

/// Any release group flags the recording as an interview, or the title
/// says so itself
pub fn is_interview(recording: &MbRecording) -> bool {
    let flagged = recording
        .releases
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|release| release.release_group.as_ref())
        .any(|group| group.secondary_types.iter().any(|t| t == "Interview"));

    flagged || recording.title.to_lowercase().contains("interview")
}

/// Title ends in an alternate-version qualifier (remix, B-side, ...)
pub fn is_alternate_version(title: &str) -> bool {
    ALT_VERSION_RE.is_match(title)
}

/// Keep only recordings with an official release
pub fn filter_official(recordings: Vec<MbRecording>) -> Vec<MbRecording> {
    recordings.into_iter().filter(has_official_release).collect()
}

/// Full recommendation filter chain: official, non-live, non-interview,
/// no alternate-version titles
pub fn filter_candidates(recordings: Vec<MbRecording>) -> Vec<MbRecording> {
    recordings
        .into_iter()
        .filter(|rec| {
            has_official_release(rec)
                && !is_live(rec)
                && !is_interview(rec)
                && !is_alternate_version(&rec.title)
        })
        .collect()
}

/// Parse a MusicBrainz partial date (YYYY, YYYY-MM or YYYY-MM-DD),
/// defaulting missing parts to the start of the period
fn parse_partial_date(date: &str) -> Option<NaiveDate> {
    let mut parts = date.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = parts.next().and_then(|d| d.parse().ok()).unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Effective release date for ordering
fn release_date_key(recording: &MbRecording) -> NaiveDate {
    recording
        .first_release_date
        .as_deref()
        .or_else(|| {
            recording
                .releases
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find_map(|release| release.date.as_deref())
        })
        .and_then(parse_partial_date)
        .unwrap_or(*FAR_FUTURE)
}

/// Order by search score descending; ties break on earliest release date
///
/// Two stable sorts: date ascending first, then score descending, so the
/// score ordering dominates and the date ordering survives within equal
/// scores.
pub fn rank_by_score_and_date(recordings: &mut [MbRecording]) {
    recordings.sort_by_key(release_date_key);
    recordings.sort_by(|a, b| b.score.unwrap_or(0).cmp(&a.score.unwrap_or(0)));
}

/// Tags with positive vote counts, highest-voted first, top three
pub fn top_tags(tags: &[MbTag]) -> Vec<String> {
    let mut voted: Vec<&MbTag> = tags
        .iter()
        .filter(|tag| tag.count.unwrap_or(0) > 0)
        .collect();
    voted.sort_by(|a, b| b.count.unwrap_or(0).cmp(&a.count.unwrap_or(0)));
    voted
        .into_iter()
        .take(TOP_TAG_COUNT)
        .map(|tag| tag.name.clone())
        .collect()
}

/// Release-group MBID of the first official release, for artwork lookup
pub fn official_release_group_id(recording: &MbRecording) -> Option<&str> {
    recording
        .releases
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|release| release.status.as_deref() == Some("Official"))
        .and_then(|release| release.release_group.as_ref())
        .map(|group| group.id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::musicbrainz_client::{MbRelease, MbReleaseGroup};

    fn recording(title: &str, score: u32, date: Option<&str>) -> MbRecording {
        MbRecording {
            id: format!("id-{}", title),
            title: title.to_string(),
            score: Some(score),
            first_release_date: date.map(str::to_string),
            disambiguation: None,
            artist_credit: vec![],
            tags: vec![],
            releases: Some(vec![MbRelease {
                id: "r1".to_string(),
                status: Some("Official".to_string()),
                date: None,
                release_group: Some(MbReleaseGroup {
                    id: "rg1".to_string(),
                    secondary_types: vec![],
                }),
            }]),
        }
    }

    #[test]
    fn test_official_release_filter() {
        let mut bootleg = recording("Hey Jude", 90, None);
        bootleg.releases.as_mut().unwrap()[0].status = Some("Bootleg".to_string());

        let kept = filter_official(vec![recording("Hey Jude", 100, None), bootleg]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, Some(100));
    }

    #[test]
    fn test_live_filter_case_insensitive() {
        let mut rec = recording("Hey Jude", 100, None);
        rec.disambiguation = Some("Live at Shea Stadium".to_string());
        assert!(is_live(&rec));

        rec.disambiguation = Some("mono mix".to_string());
        assert!(!is_live(&rec));
    }

    #[test]
    fn test_interview_via_secondary_type() {
        let mut rec = recording("Press Conference 1964", 100, None);
        rec.releases.as_mut().unwrap()[0]
            .release_group
            .as_mut()
            .unwrap()
            .secondary_types = vec!["Interview".to_string()];
        assert!(is_interview(&rec));
    }

    #[test]
    fn test_interview_via_title() {
        let rec = recording("The Lost Interview", 100, None);
        assert!(is_interview(&rec));
        assert!(!is_interview(&recording("Hey Jude", 100, None)));
    }

    #[test]
    fn test_alternate_version_titles() {
        assert!(is_alternate_version("Blue Monday (Extended Mix)"));
        assert!(is_alternate_version("Temptation [12\u{2033} version remix]"));
        assert!(is_alternate_version("Atmosphere (B-side)"));
        assert!(!is_alternate_version("Love Will Tear Us Apart"));
        // Qualifier must be trailing
        assert!(!is_alternate_version("(Remix) In My Head"));
    }

    #[test]
    fn test_filter_candidates_chain() {
        let mut live = recording("Hey Jude", 95, None);
        live.disambiguation = Some("live, 1968".to_string());

        let kept = filter_candidates(vec![
            recording("Hey Jude", 100, None),
            live,
            recording("Hey Jude (Remix)", 90, None),
            recording("Studio Interview", 85, None),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Hey Jude");
    }

    #[test]
    fn test_rank_score_primary_date_tiebreak() {
        let mut recs = vec![
            recording("b", 90, Some("1970-01-01")),
            recording("c", 100, Some("1980")),
            recording("a", 100, Some("1968-08-26")),
            recording("d", 100, None),
        ];
        rank_by_score_and_date(&mut recs);

        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        // Score 100 first, ordered by date; missing date last among equals
        assert_eq!(titles, vec!["a", "c", "d", "b"]);
    }

    #[test]
    fn test_partial_date_parsing() {
        assert_eq!(
            parse_partial_date("1968-08-26"),
            NaiveDate::from_ymd_opt(1968, 8, 26)
        );
        assert_eq!(
            parse_partial_date("1968"),
            NaiveDate::from_ymd_opt(1968, 1, 1)
        );
        assert_eq!(
            parse_partial_date("1968-08"),
            NaiveDate::from_ymd_opt(1968, 8, 1)
        );
        assert_eq!(parse_partial_date("not a date"), None);
    }

    #[test]
    fn test_top_tags_ordering_and_cap() {
        let tags = vec![
            MbTag { name: "rock".to_string(), count: Some(7) },
            MbTag { name: "noise".to_string(), count: Some(0) },
            MbTag { name: "pop".to_string(), count: Some(12) },
            MbTag { name: "beat".to_string(), count: Some(3) },
            MbTag { name: "british".to_string(), count: Some(5) },
            MbTag { name: "unknown".to_string(), count: None },
        ];
        assert_eq!(top_tags(&tags), vec!["pop", "rock", "british"]);
    }

    #[test]
    fn test_official_release_group_id() {
        let rec = recording("Hey Jude", 100, None);
        assert_eq!(official_release_group_id(&rec), Some("rg1"));

        let mut bootleg = recording("Hey Jude", 100, None);
        bootleg.releases.as_mut().unwrap()[0].status = Some("Bootleg".to_string());
        assert_eq!(official_release_group_id(&bootleg), None);
    }
}
