use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use hifitime::Epoch;
use log::{debug, info, warn};
use regex::Regex;
use sgp4::chrono::NaiveDateTime;
use sgp4::{Constants, Elements};
use crate::error::{OrbitError, Result};
use crate::time::from_element_datetime;

// Optional name line, then line 1 and line 2 of an element set. Both element lines are 69
// columns. A name line never starts like an element line.
static TLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?m)^(?:(?<name>[^12\s][^\r\n]*|[12](?:[^ \r\n][^\r\n]*)?)\r?\n)?",
        r"(?<line1>1 [^\r\n]{67})[ \t\r]*\n(?<line2>2 [^\r\n]{67})",
    ))
    .expect("TLE pattern is valid")
});

pub(crate) struct ElementRecord {
    name: String,
    elements: Elements,
    constants: Constants,
    epoch: Epoch,
    line1: String,
    line2: String,
}

impl ElementRecord {
    /// Sets without a name line go by their catalog number
    pub(crate) fn from_tle(name: Option<&str>, line1: &str, line2: &str) -> Result<ElementRecord> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        let name = match name.map(str::trim) {
            Some(name) => name.strip_prefix("0 ").unwrap_or(name).trim().to_string(),
            None => line1.get(2..7).unwrap_or_default().trim().trim_start_matches('0').to_string(),
        };

        let elements = Elements::from_tle(Some(name.clone()), line1.as_bytes(), line2.as_bytes())
            .map_err(|error| OrbitError::InvalidElements { name: name.clone(), reason: error.to_string() })?;
        let constants = Constants::from_elements(&elements)
            .map_err(|error| OrbitError::InvalidElements { name: name.clone(), reason: error.to_string() })?;
        let epoch = from_element_datetime(&elements.datetime);

        Ok(ElementRecord {
            name,
            elements,
            constants,
            epoch,
            line1: line1.to_string(),
            line2: line2.to_string(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub(crate) fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Reference epoch as SGP4 counts it
    pub(crate) fn element_datetime(&self) -> &NaiveDateTime {
        &self.elements.datetime
    }

    /// Reference epoch of the element set
    pub(crate) fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub(crate) fn tle_text(&self) -> String {
        format!("{}\n{}\n{}", self.name, self.line1, self.line2)
    }
}

///
/// Satellites by display name, in the order the feed listed them
///
pub(crate) struct ElementCatalog {
    records: Vec<ElementRecord>,
    index: HashMap<String, usize>,
}

impl ElementCatalog {
    pub(crate) fn empty() -> ElementCatalog {
        ElementCatalog { records: Vec::new(), index: HashMap::new() }
    }

    /// A repeated name replaces the earlier record but keeps its position.
    pub(crate) fn from_records(records: impl IntoIterator<Item = ElementRecord>) -> ElementCatalog {
        let mut catalog = ElementCatalog::empty();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    pub(crate) fn parse(text: &str) -> Result<ElementCatalog> {
        let mut skipped = 0;
        let records = TLE_REGEX.captures_iter(text)
            .filter_map(|captures| {
                let name = captures.name("name").map(|name| name.as_str());
                match ElementRecord::from_tle(name, &captures["line1"], &captures["line2"]) {
                    Ok(record) => Some(record),
                    Err(error) => {
                        warn!("Skipping element set: {error}");
                        skipped += 1;
                        None
                    }
                }
            })
            .collect::<Vec<_>>();

        let catalog = ElementCatalog::from_records(records);
        debug!("Parsed {} element sets, skipped {}", catalog.len(), skipped);

        if catalog.is_empty() {
            return Err(OrbitError::EmptyCatalog);
        }
        Ok(catalog)
    }

    pub(crate) fn fetch(url: &str) -> Result<ElementCatalog> {
        info!("Fetching element sets from {url}");
        let fetch_error = |reason: String| OrbitError::Fetch { url: url.to_string(), reason };

        let response = ureq::get(url).call()
            .map_err(|error| fetch_error(error.to_string()))?;
        let body = response.into_string()
            .map_err(|error| fetch_error(error.to_string()))?;

        let catalog = Self::parse(&body)?;
        info!("Loaded {} satellites", catalog.len());
        Ok(catalog)
    }

    pub(crate) fn load(path: &Path) -> Result<ElementCatalog> {
        info!("Reading element sets from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::parse(&text)?;
        info!("Loaded {} satellites", catalog.len());
        Ok(catalog)
    }

    fn insert(&mut self, record: ElementRecord) {
        match self.index.get(record.name()) {
            Some(&position) => {
                debug!("Replacing element set for {}", record.name());
                self.records[position] = record;
            }
            None => {
                self.index.insert(record.name().to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ElementRecord> {
        self.index.get(name).map(|&position| &self.records[position])
    }

    pub(crate) fn first(&self) -> Option<&ElementRecord> {
        self.records.first()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(ElementRecord::name)
    }

    /// Entries offered in the satellite dropdown
    pub(crate) fn display_names(&self, limit: usize) -> Vec<&str> {
        self.names().take(limit).collect()
    }
}


#[cfg(test)]
pub(crate) mod tests {
    use assert_float_eq::assert_float_absolute_eq;
    use super::*;

    pub(crate) const ISS_2008: &str = "\
ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";

    pub(crate) const ISS_2020: &str = "\
ISS (ZARYA)
1 25544U 98067A   20148.21301450  .00001715  00000-0  38778-4 0  9992
2 25544  51.6435  92.2789 0002570 358.0648 144.9972 15.49396855228767
";

    /// Modulo-10 checksum over the first 68 columns of an element line
    fn checksum(line: &str) -> u32 {
        line.chars()
            .take(68)
            .map(|c| match c {
                '0'..='9' => c.to_digit(10).unwrap(),
                '-' => 1,
                _ => 0,
            })
            .sum::<u32>() % 10
    }

    /// The 2020 ISS elements under another name and catalog number
    pub(crate) fn synthetic_set(name: &str, norad_id: u32) -> String {
        let lines = ISS_2020.lines().collect::<Vec<_>>();
        let line1 = format!("1 {norad_id:05}{}", &lines[1][7..68]);
        let line2 = format!("2 {norad_id:05}{}", &lines[2][7..68]);
        format!("{name}\n{line1}{}\n{line2}{}\n", checksum(&line1), checksum(&line2))
    }

    pub(crate) fn synthetic_catalog(count: u32) -> ElementCatalog {
        let text = (0..count)
            .map(|i| synthetic_set(&format!("SAT-{i:03}"), 10_000 + i))
            .collect::<String>();
        ElementCatalog::parse(&text).unwrap()
    }

    #[test]
    fn test_checksum_fixtures() {
        for line in ISS_2008.lines().chain(ISS_2020.lines()).skip(1).filter(|l| l.len() == 69) {
            assert_eq!(checksum(line), line[68..].parse::<u32>().unwrap());
        }
    }

    #[test]
    fn test_parse_single() {
        let catalog = ElementCatalog::parse(ISS_2008).unwrap();
        assert_eq!(catalog.len(), 1);

        let record = catalog.get("ISS (ZARYA)").unwrap();
        assert_eq!(record.norad_id(), 25544);
        let expected_epoch = Epoch::from_gregorian_utc(2008, 9, 20, 12, 25, 40, 104_192_000);
        assert_float_absolute_eq!((record.epoch() - expected_epoch).to_seconds(), 0.0, 1e-3);
        assert_eq!(record.tle_text(), ISS_2008.trim_end());
    }

    #[test]
    fn test_checksum_ignores_check_digit() {
        let line1 = ISS_2008.lines().nth(1).unwrap();
        assert_eq!(checksum(line1), 7);
        assert_eq!(checksum(line1), checksum(&line1[..68]));
    }

    #[test]
    fn test_parse_two_line_feed() {
        let bare = |text: &str| text.lines().skip(1).map(|line| format!("{line}\n")).collect::<String>();
        let text = bare(ISS_2020) + &bare(&synthetic_set("UNUSED", 4242));
        let catalog = ElementCatalog::parse(&text).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["25544", "4242"]);
        assert_eq!(catalog.get("25544").unwrap().norad_id(), 25544);
        assert_eq!(catalog.get("4242").unwrap().norad_id(), 4242);
    }

    #[test]
    fn test_parse_mixed_feed() {
        let bare = ISS_2008.lines().skip(1).map(|line| format!("{line}\r\n")).collect::<String>();
        let text = synthetic_set("ALPHA", 1) + &bare + &synthetic_set("BRAVO", 2);
        let catalog = ElementCatalog::parse(&text).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["ALPHA", "25544", "BRAVO"]);
        assert!(catalog.names().all(|name| !name.starts_with("1 ") && !name.starts_with("2 ")));
    }

    #[test]
    fn test_parse_keeps_order() {
        let text = [synthetic_set("CHARLIE", 3), synthetic_set("ALPHA", 1), synthetic_set("BRAVO", 2)].concat();
        let catalog = ElementCatalog::parse(&text).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["CHARLIE", "ALPHA", "BRAVO"]);
        assert_eq!(catalog.first().unwrap().name(), "CHARLIE");
    }

    #[test]
    fn test_parse_strips_prefix_and_padding() {
        let text = "0 ISS (ZARYA)            \r\n".to_string()
            + &ISS_2020.lines().skip(1).map(|line| format!("{line}\r\n")).collect::<String>();
        let catalog = ElementCatalog::parse(&text).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["ISS (ZARYA)"]);
    }

    #[test]
    fn test_parse_skips_malformed() {
        let malformed = "\
BROKEN
1 25544U 98067A   0826X.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537
";
        let text = format!("some header\n{malformed}{}", synthetic_set("GOOD", 4242));
        let catalog = ElementCatalog::parse(&text).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("BROKEN").is_none());
        assert_eq!(catalog.get("GOOD").unwrap().norad_id(), 4242);
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let text = [synthetic_set("ALPHA", 1), synthetic_set("BRAVO", 2), synthetic_set("ALPHA", 3)].concat();
        let catalog = ElementCatalog::parse(&text).unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["ALPHA", "BRAVO"]);
        assert_eq!(catalog.get("ALPHA").unwrap().norad_id(), 3);
    }

    #[test]
    fn test_empty_feed() {
        assert!(matches!(ElementCatalog::parse(""), Err(OrbitError::EmptyCatalog)));
        assert!(matches!(ElementCatalog::parse("no element sets here\n"), Err(OrbitError::EmptyCatalog)));
    }

    #[test]
    fn test_display_names_limit() {
        let catalog = synthetic_catalog(60);
        assert_eq!(catalog.len(), 60);

        let names = catalog.display_names(50);
        assert_eq!(names.len(), 50);
        assert_eq!(names[0], "SAT-000");
        assert_eq!(names[49], "SAT-049");

        assert_eq!(synthetic_catalog(3).display_names(50).len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let result = ElementCatalog::load(Path::new("/nonexistent/elements.tle"));
        assert!(matches!(result, Err(OrbitError::Io(_))));
    }
}
