use std::time::Duration;

use billchat_agent::OllamaClient;
use billchat_billing::{BillingBackend, Credentials, HttpBillingBackend};
use billchat_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{current_thread_runtime, escape_json, CommandResult};

const DOCTOR_FAILURE_EXIT_CODE: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    /// Degraded but servable; chat keeps working through the keyword path.
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { DOCTOR_FAILURE_EXIT_CODE } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match current_thread_runtime() {
                Ok(runtime) => {
                    checks.push(runtime.block_on(check_llm_reachability(&config)));
                    checks.push(runtime.block_on(check_billing_login(&config)));
                }
                Err(error) => {
                    for name in ["llm_reachability", "billing_login"] {
                        checks.push(DoctorCheck {
                            name,
                            status: CheckStatus::Fail,
                            details: error.clone(),
                        });
                    }
                }
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_reachability", "billing_login"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let any_warn = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let (overall_status, summary) = if any_fail {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if any_warn {
        (CheckStatus::Warn, "doctor: ready with degraded intent resolution")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

async fn check_llm_reachability(config: &AppConfig) -> DoctorCheck {
    let client = match OllamaClient::from_config(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "llm_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to build language model client: {error}"),
            };
        }
    };

    if client.is_available().await {
        DoctorCheck {
            name: "llm_reachability",
            status: CheckStatus::Pass,
            details: format!("`{}` reachable at {}", client.model(), config.llm.base_url),
        }
    } else {
        DoctorCheck {
            name: "llm_reachability",
            status: CheckStatus::Warn,
            details: format!(
                "{} unreachable; messages will be resolved by keyword matching",
                config.llm.base_url
            ),
        }
    }
}

async fn check_billing_login(config: &AppConfig) -> DoctorCheck {
    // Probes are short so an unreachable backend does not stall the report.
    let timeout = Duration::from_secs(config.billing.timeout_secs.min(10));
    let backend = match HttpBillingBackend::new(config.billing.base_url.clone(), timeout) {
        Ok(backend) => backend,
        Err(error) => {
            return DoctorCheck {
                name: "billing_login",
                status: CheckStatus::Fail,
                details: format!("failed to build billing client: {error}"),
            };
        }
    };

    let credentials = Credentials {
        username: config.billing.username.clone(),
        password: config.billing.password.clone(),
    };
    match backend.login(&credentials).await {
        Ok(_) => DoctorCheck {
            name: "billing_login",
            status: CheckStatus::Pass,
            details: format!(
                "logged in as `{}` at {}",
                config.billing.username, config.billing.base_url
            ),
        },
        Err(error) => DoctorCheck {
            name: "billing_login",
            status: CheckStatus::Fail,
            details: format!("login at {} failed: {error}", config.billing.base_url),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
