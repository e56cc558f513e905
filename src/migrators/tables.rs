//! Lookup tables and pure field mappings from legacy values.

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::AppError;
use crate::models::RecruitedStudent;

/// Target publish status for a legacy `post_publish_status`.
pub fn article_publish_status(legacy: i64) -> u8 {
    match legacy {
        0 => 1,
        1 => 0,
        2 => 2,
        3 => 3,
        _ => 0,
    }
}

/// Status 4 marks a rejected post.
pub fn article_approval_status(legacy: i64) -> bool {
    legacy != 4
}

/// Target live record type from the legacy type flag and placement category.
pub fn live_type(legacy_type: i64, category: &str) -> u8 {
    if legacy_type == 0 {
        return 4;
    }
    match category {
        "normal" => 1,
        "dream" => 2,
        "sdream" => 3,
        _ => 0,
    }
}

/// Autumn semester (0) runs from June; spring (1) is January to May.
pub fn semester(month: u32) -> u8 {
    if month > 5 {
        0
    } else {
        1
    }
}

pub fn degree_name(key: &str) -> &'static str {
    match key {
        "btech" => "B.Tech",
        "mtech" => "M.Tech",
        "mtechr" => "M.Tech (Research)",
        "dual" => "Dual Degree M.Tech",
        "rmsc" => "M.Sc",
        "imsc" => "Integrated M.Sc",
        "phd" => "PhD",
        _ => "School of Management",
    }
}

const BRANCHES: [&str; 23] = [
    "Biotechnology & Biomedical Engineering",
    "Ceramic Engineering",
    "Chemical Engineering",
    "Civil Engineering",
    "Computer Science and Engineering",
    "Department of Chemistry",
    "Department of Humanities",
    "Department of Life Science",
    "Department of Mathematics",
    "Department of Physics",
    "Electrical Engineering",
    "Electronics and Communication Engineering",
    "Food Process Engineering",
    "Industrial Design",
    "Mechanical Engineering",
    "Metallurgical and Materials Engineering",
    "Mining Engineering",
    "Planning and Architecture",
    "School of Management",
    "Department of Earth and Atmospheric Science",
    "Electronics and Instrumentation Engineering",
    "Safety Engineering",
    "Department of Applied Geology",
];

/// Branch name for a 1-based legacy branch code; unknown codes are blank.
pub fn branch_name(code: i64) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|c| c.checked_sub(1))
        .and_then(|i| BRANCHES.get(i))
        .copied()
        .unwrap_or("")
}

#[derive(Deserialize)]
struct BranchGroup {
    #[serde(default)]
    branch: JsonValue,
    #[serde(default)]
    name: Vec<String>,
}

/// Expands `{degree: [{branch, name: [..]}]}` into one entry per student.
pub fn parse_students_recruited(raw: &str) -> Result<Vec<RecruitedStudent>, AppError> {
    if raw.trim().is_empty() {
        return Ok(vec![]);
    }
    let degrees: Map<String, JsonValue> = serde_json::from_str(raw)?;

    let mut students = Vec::new();
    for (degree, groups) in degrees {
        let groups: Vec<BranchGroup> = serde_json::from_value(groups)?;
        for group in groups {
            let code = match &group.branch {
                JsonValue::Number(n) => n.as_i64(),
                JsonValue::String(s) => s.trim().parse().ok(),
                _ => None,
            };
            let branch = code.map(branch_name).unwrap_or("");
            students.extend(group.name.into_iter().map(|name| RecruitedStudent {
                degree: degree_name(&degree).to_string(),
                branch: branch.to_string(),
                name,
            }));
        }
    }
    Ok(students)
}

/// A zero bonus means no listed benefits.
pub fn live_benefits(bonus: &str) -> String {
    match bonus.trim() {
        "0" | "0.0" => String::new(),
        other => other.to_string(),
    }
}

pub fn live_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Lower-cases the extension of a legacy file name.
pub fn fix_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}.{}", stem, ext.to_lowercase()),
        None => file_name.to_string(),
    }
}

/// Address rules for one mail domain.
pub struct MailDomain {
    domain: String,
    pattern: Regex,
    non_word_before_at: Regex,
}

impl MailDomain {
    pub fn new(domain: &str) -> Result<Self, AppError> {
        let pattern = format!(
            r#"(?i)^(([^<>()\[\]\.,;:\s@"]+(\.[^<>()\[\]\.,;:\s@"]+)*)|(".+"))@{}$"#,
            regex::escape(domain)
        );
        let compile = |p: &str| {
            Regex::new(p).map_err(|e| AppError::Internal(format!("invalid mail pattern: {}", e)))
        };

        Ok(Self {
            domain: domain.to_string(),
            pattern: compile(&pattern)?,
            non_word_before_at: compile(r"\W@")?,
        })
    }

    pub fn matches(&self, address: &str) -> bool {
        self.pattern.is_match(address.trim())
    }

    /// First of `candidates` in this domain, else a `transfer-<login>` address.
    pub fn normalize(&self, candidates: &[&str], login: &str) -> String {
        if let Some(found) = candidates.iter().find(|c| self.matches(c)) {
            return found.trim().to_string();
        }

        let local: String = login
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '@')
            .collect();
        let address = format!("transfer-{}@{}", local, self.domain);
        self.non_word_before_at
            .replace_all(&address, "@")
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_status_table() {
        let cases = [(0, 1), (1, 0), (2, 2), (3, 3), (4, 0), (5, 0), (-1, 0)];
        for (legacy, expected) in cases {
            assert_eq!(article_publish_status(legacy), expected, "status {}", legacy);
        }
        assert!(article_approval_status(0));
        assert!(article_approval_status(3));
        assert!(!article_approval_status(4));
    }

    #[test]
    fn test_live_type_table() {
        assert_eq!(live_type(0, "dream"), 4);
        assert_eq!(live_type(1, "normal"), 1);
        assert_eq!(live_type(1, "dream"), 2);
        assert_eq!(live_type(1, "sdream"), 3);
        assert_eq!(live_type(1, "internship"), 0);
        assert_eq!(live_type(2, ""), 0);
    }

    #[test]
    fn test_semester_table() {
        for month in 1..=5 {
            assert_eq!(semester(month), 1);
        }
        for month in 6..=12 {
            assert_eq!(semester(month), 0);
        }
    }

    #[test]
    fn test_degree_and_branch_tables() {
        assert_eq!(degree_name("btech"), "B.Tech");
        assert_eq!(degree_name("mtechr"), "M.Tech (Research)");
        assert_eq!(degree_name("dual"), "Dual Degree M.Tech");
        assert_eq!(degree_name("rmsc"), "M.Sc");
        assert_eq!(degree_name("imsc"), "Integrated M.Sc");
        assert_eq!(degree_name("phd"), "PhD");
        assert_eq!(degree_name("som"), "School of Management");
        assert_eq!(degree_name("somanagement"), "School of Management");
        assert_eq!(degree_name("unknown"), "School of Management");

        assert_eq!(branch_name(1), "Biotechnology & Biomedical Engineering");
        assert_eq!(branch_name(5), "Computer Science and Engineering");
        assert_eq!(branch_name(23), "Department of Applied Geology");
        assert_eq!(branch_name(0), "");
        assert_eq!(branch_name(24), "");
        assert_eq!(branch_name(-3), "");
    }

    #[test]
    fn test_students_recruited_expansion() {
        let raw = r#"{"btech": [{"branch": "5", "name": ["A", "B"]}, {"branch": 99, "name": ["C"]}],
                      "phd": [{"branch": 10, "name": ["D"]}]}"#;
        let students = parse_students_recruited(raw).unwrap();
        assert_eq!(students.len(), 4);
        assert_eq!(students[0].degree, "B.Tech");
        assert_eq!(students[0].branch, "Computer Science and Engineering");
        assert_eq!(students[1].name, "B");
        assert_eq!(students[2].branch, "");
        assert_eq!(students[3].degree, "PhD");
        assert_eq!(students[3].branch, "Department of Physics");

        assert!(parse_students_recruited("").unwrap().is_empty());
        assert!(parse_students_recruited("[1]").is_err());
    }

    #[test]
    fn test_live_helpers() {
        assert_eq!(live_benefits("0"), "");
        assert_eq!(live_benefits("Joining bonus"), "Joining bonus");
        assert_eq!(live_date(2021, 2, 30), None);
        assert_eq!(live_date(2021, 2, 3), NaiveDate::from_ymd_opt(2021, 2, 3));
    }

    #[test]
    fn test_fix_extension() {
        assert_eq!(fix_extension("Photo.JPG"), "Photo.jpg");
        assert_eq!(fix_extension("a.b.PNG"), "a.b.png");
        assert_eq!(fix_extension("noext"), "noext");
    }

    #[test]
    fn test_email_normalization() {
        let primary = MailDomain::new("gmail.com").unwrap();
        assert_eq!(
            primary.normalize(&["someone@gmail.com", "login"], "login"),
            "someone@gmail.com"
        );
        assert_eq!(
            primary.normalize(&["someone@yahoo.com", "Login@GMAIL.com"], "Login@GMAIL.com"),
            "Login@GMAIL.com"
        );
        assert_eq!(
            primary.normalize(&["someone@yahoo.com", "john doe"], "john doe"),
            "transfer-johndoe@gmail.com"
        );
        assert_eq!(
            primary.normalize(&["", "john.@x.org"], "john.@x.org"),
            "transfer-johnx.org@gmail.com"
        );
        assert_eq!(primary.normalize(&["", "bob."], "bob."), "transfer-bob@gmail.com");

        let institute = MailDomain::new("example.edu").unwrap();
        assert!(institute.matches("a.b@example.edu"));
        assert!(!institute.matches("a.b@example.edu.org"));
        assert!(!institute.matches("a..b@example.edu"));
    }
}
