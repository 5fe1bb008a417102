//! Routing decision, computed once per input

use crate::chat::job_name::extract_job_name;
use crate::config::ChatConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Hand-built projection over the job parameter table
    SummarizeJobParameters {
        /// Name quoted in the input; `None` falls back to session memory
        job_name_hint: Option<String>,
        filter_to_awi: bool,
    },
    /// Anything else goes through query generation
    GenericQuestion { text: String },
}

impl Intent {
    pub fn classify(input: &str, config: &ChatConfig) -> Self {
        if input.contains(&config.trigger_phrase) {
            Intent::SummarizeJobParameters {
                job_name_hint: extract_job_name(input),
                filter_to_awi: input.contains(&config.awi_marker),
            }
        } else {
            Intent::GenericQuestion {
                text: input.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"Summarize the parameters for the job named "Acme Run" AWI"#, Some("Acme Run"), true)]
    #[case(r#"Summarize the parameters for the job named "Acme Run""#, Some("Acme Run"), false)]
    #[case("Summarize the parameters for the job named", None, false)]
    #[case("Please Summarize the parameters for the job named it, AWI only", None, true)]
    fn test_classify_summary(
        #[case] input: &str,
        #[case] hint: Option<&str>,
        #[case] awi: bool,
    ) {
        assert_eq!(
            Intent::classify(input, &ChatConfig::default()),
            Intent::SummarizeJobParameters {
                job_name_hint: hint.map(String::from),
                filter_to_awi: awi,
            }
        );
    }

    #[rstest]
    #[case("How many employees are there")]
    #[case(r#"summarize the parameters for the job named "lowercase""#)]
    #[case("What is the AWI score of job 7?")]
    fn test_classify_generic(#[case] input: &str) {
        assert_eq!(
            Intent::classify(input, &ChatConfig::default()),
            Intent::GenericQuestion {
                text: input.to_string()
            }
        );
    }

    #[test]
    fn test_classify_uses_configured_phrase() {
        let config = ChatConfig {
            trigger_phrase: "Show job".to_string(),
            ..ChatConfig::default()
        };
        assert!(matches!(
            Intent::classify("Show job for the job named \"x\"", &config),
            Intent::SummarizeJobParameters { job_name_hint: Some(ref n), .. } if n == "x"
        ));
    }
}
