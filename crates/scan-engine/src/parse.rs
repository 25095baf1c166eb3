//! Tool output normalization.
//!
//! Raw tool output differs per scanner; these functions reduce each one
//! to the section payload shape the renderer and API expose:
//!
//! - static analysis: `{summary: {total_findings, severity_breakdown},
//!   findings: [{severity, rule_id, file, line, message, category}]}`
//! - dependency check: `{summary: {total_dependencies,
//!   vulnerable_dependencies, severities}, vulnerabilities: [...]}`
//! - secret scan: `{totalFindings, findings}`
//! - threat model: passed through unchanged
//!
//! Normalization is lossy by design: only the fields the report surface
//! uses are kept.

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::ScanEngineError;

/// Normalize semgrep JSON (stdout) into the static-analysis payload.
pub fn normalize_static_analysis(scanner: &str, stdout: &[u8]) -> Result<Value, ScanEngineError> {
    let raw: Value = serde_json::from_slice(stdout).map_err(|e| ScanEngineError::ParseFailed {
        scanner: scanner.to_owned(),
        reason: e.to_string(),
    })?;

    let empty = Vec::new();
    let results = raw["results"].as_array().unwrap_or(&empty);

    let mut breakdown: Map<String, Value> = Map::new();
    let mut findings = Vec::with_capacity(results.len());

    for result in results {
        let severity = result["extra"]["severity"].as_str().unwrap_or("INFO");
        let count = breakdown.entry(severity.to_owned()).or_insert(json!(0));
        *count = json!(count.as_u64().unwrap_or(0) + 1);

        findings.push(json!({
            "severity": severity,
            "rule_id": result["check_id"].as_str().unwrap_or("N/A"),
            "file": result["path"].as_str().unwrap_or("N/A"),
            "line": result["start"]["line"].as_u64().unwrap_or(0),
            "message": result["extra"]["message"].as_str().unwrap_or("No message"),
            "category": result["extra"]["metadata"]["category"]
                .as_str()
                .unwrap_or("general"),
        }));
    }

    Ok(json!({
        "summary": {
            "total_findings": findings.len(),
            "severity_breakdown": Value::Object(breakdown),
        },
        "findings": findings,
    }))
}

/// Normalize a dependency-check JSON report file into the
/// dependency-check payload: dependencies are flattened into one
/// vulnerability entry per (dependency, vulnerability) pair.
pub fn normalize_dependency_check(scanner: &str, report: &[u8]) -> Result<Value, ScanEngineError> {
    let raw: Value = serde_json::from_slice(report).map_err(|e| ScanEngineError::ParseFailed {
        scanner: scanner.to_owned(),
        reason: e.to_string(),
    })?;

    let empty = Vec::new();
    let dependencies = raw["dependencies"].as_array().unwrap_or(&empty);

    let mut severities: Map<String, Value> = Map::new();
    let mut vulnerabilities = Vec::new();

    for dep in dependencies {
        let Some(vulns) = dep["vulnerabilities"].as_array() else {
            continue;
        };
        for vuln in vulns {
            let severity = vuln["severity"].as_str().unwrap_or("unknown");
            let count = severities.entry(severity.to_owned()).or_insert(json!(0));
            *count = json!(count.as_u64().unwrap_or(0) + 1);

            let cvss = vuln["cvssv3"]["baseScore"]
                .clone()
                .is_null()
                .then(|| vuln["cvssv2"]["baseScore"].clone())
                .unwrap_or_else(|| vuln["cvssv3"]["baseScore"].clone());

            vulnerabilities.push(json!({
                "fileName": dep["fileName"].as_str().unwrap_or("N/A"),
                "packagePath": dep["filePath"].as_str().unwrap_or("N/A"),
                "severity": severity,
                "cve": vuln["name"].as_str().unwrap_or("N/A"),
                "cwe": vuln["cwe"].clone(),
                "description": vuln["description"].as_str().unwrap_or(""),
                "source": vuln["source"].as_str().unwrap_or("N/A"),
                "cvssScore": if cvss.is_null() { json!("N/A") } else { cvss },
                "reference": vuln["references"][0]["url"].as_str().unwrap_or("N/A"),
            }));
        }
    }

    Ok(json!({
        "summary": {
            "total_dependencies": dependencies.len(),
            "vulnerable_dependencies": vulnerabilities.len(),
            "severities": Value::Object(severities),
        },
        "vulnerabilities": vulnerabilities,
    }))
}

/// Normalize a gitleaks JSON report file into the secret-scan payload.
///
/// An unparseable report degrades to an empty finding list: gitleaks has
/// been observed truncating the report on some abort paths, and a
/// missing secret listing must not lose the rest of the aggregate.
pub fn normalize_secret_scan(scanner: &str, report: &[u8]) -> Value {
    let findings: Vec<Value> = match serde_json::from_slice(report) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(scanner, "secret scan report is not an array, treating as empty");
            Vec::new()
        }
        Err(e) => {
            warn!(scanner, error = %e, "secret scan report unparseable, treating as empty");
            Vec::new()
        }
    };

    json!({
        "totalFindings": findings.len(),
        "findings": findings,
    })
}

/// Parse threat-model tool stdout; the payload passes through unchanged.
pub fn parse_threat_model(scanner: &str, stdout: &[u8]) -> Result<Value, ScanEngineError> {
    serde_json::from_slice(stdout).map_err(|e| ScanEngineError::ParseFailed {
        scanner: scanner.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_analysis_builds_summary_and_findings() {
        let stdout = json!({
            "results": [
                {
                    "check_id": "rust.lang.security.unsafe-usage",
                    "path": "src/main.rs",
                    "start": {"line": 42},
                    "extra": {
                        "severity": "ERROR",
                        "message": "unsafe block",
                        "metadata": {"category": "security"}
                    }
                },
                {
                    "check_id": "generic.secrets.gitleaks",
                    "path": "config.py",
                    "start": {"line": 7},
                    "extra": {"severity": "ERROR", "message": "hardcoded token"}
                },
                {
                    "check_id": "no-extra",
                    "path": "x.js",
                    "start": {},
                    "extra": {}
                }
            ]
        })
        .to_string();

        let payload = normalize_static_analysis("static-analysis", stdout.as_bytes()).unwrap();
        assert_eq!(payload["summary"]["total_findings"], 3);
        assert_eq!(payload["summary"]["severity_breakdown"]["ERROR"], 2);
        assert_eq!(payload["summary"]["severity_breakdown"]["INFO"], 1);
        assert_eq!(payload["findings"][0]["rule_id"], "rust.lang.security.unsafe-usage");
        assert_eq!(payload["findings"][0]["line"], 42);
        assert_eq!(payload["findings"][2]["category"], "general");
        assert_eq!(payload["findings"][2]["message"], "No message");
    }

    #[test]
    fn static_analysis_rejects_non_json() {
        let err = normalize_static_analysis("static-analysis", b"semgrep crashed").unwrap_err();
        assert!(matches!(err, ScanEngineError::ParseFailed { .. }));
    }

    #[test]
    fn dependency_check_flattens_vulnerable_dependencies() {
        let report = json!({
            "dependencies": [
                {"fileName": "clean-lib-1.0.jar"},
                {
                    "fileName": "log4j-core-2.14.1.jar",
                    "filePath": "/scan/lib/log4j-core-2.14.1.jar",
                    "vulnerabilities": [
                        {
                            "name": "CVE-2021-44228",
                            "severity": "CRITICAL",
                            "description": "JNDI lookup remote code execution",
                            "source": "NVD",
                            "cvssv3": {"baseScore": 10.0},
                            "references": [{"url": "https://nvd.nist.gov/vuln/detail/CVE-2021-44228"}]
                        },
                        {
                            "name": "CVE-2021-45046",
                            "severity": "CRITICAL",
                            "cvssv2": {"baseScore": 5.1}
                        }
                    ]
                }
            ]
        })
        .to_string();

        let payload = normalize_dependency_check("dependency-check", report.as_bytes()).unwrap();
        assert_eq!(payload["summary"]["total_dependencies"], 2);
        assert_eq!(payload["summary"]["vulnerable_dependencies"], 2);
        assert_eq!(payload["summary"]["severities"]["CRITICAL"], 2);
        assert_eq!(payload["vulnerabilities"][0]["cve"], "CVE-2021-44228");
        assert_eq!(payload["vulnerabilities"][0]["cvssScore"], 10.0);
        // cvssv2 fallback when cvssv3 is absent
        assert_eq!(payload["vulnerabilities"][1]["cvssScore"], 5.1);
    }

    #[test]
    fn dependency_check_without_scores_uses_na() {
        let report = json!({
            "dependencies": [
                {"fileName": "a.jar", "vulnerabilities": [{"name": "CVE-1", "severity": "LOW"}]}
            ]
        })
        .to_string();
        let payload = normalize_dependency_check("dependency-check", report.as_bytes()).unwrap();
        assert_eq!(payload["vulnerabilities"][0]["cvssScore"], "N/A");
        assert_eq!(payload["vulnerabilities"][0]["reference"], "N/A");
    }

    #[test]
    fn secret_scan_counts_findings() {
        let report = json!([
            {"RuleID": "aws-access-token", "File": ".env", "StartLine": 3},
            {"RuleID": "generic-api-key", "File": "config.yml", "StartLine": 19}
        ])
        .to_string();
        let payload = normalize_secret_scan("secret-scan", report.as_bytes());
        assert_eq!(payload["totalFindings"], 2);
        assert_eq!(payload["findings"][0]["RuleID"], "aws-access-token");
    }

    #[test]
    fn secret_scan_degrades_on_garbage() {
        let payload = normalize_secret_scan("secret-scan", b"not json at all");
        assert_eq!(payload["totalFindings"], 0);
        let payload = normalize_secret_scan("secret-scan", b"{\"not\": \"an array\"}");
        assert_eq!(payload["totalFindings"], 0);
    }

    #[test]
    fn threat_model_passes_through() {
        let stdout = json!({
            "summary": {"totalThreats": 2},
            "techStack": {"languages": ["rust"]},
            "threats": [{"title": "Unvalidated webhook input", "severity": "high"}]
        })
        .to_string();
        let payload = parse_threat_model("threat-model", stdout.as_bytes()).unwrap();
        assert_eq!(payload["summary"]["totalThreats"], 2);
    }

    #[test]
    fn threat_model_rejects_non_json() {
        assert!(parse_threat_model("threat-model", b"").is_err());
    }
}
