//! Logic App identity parsed from a portal URL

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ID_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)/id/(.+)").expect("valid id segment pattern"));

static RESOURCE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)subscriptions/([^/?#]+)/resourcegroups/([^/?#]+)/providers/Microsoft\.Logic/workflows/([^/?#]+)",
    )
    .expect("valid resource path pattern")
});

/// Identifies a single Logic App workflow resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRef {
    pub subscription_id: String,
    pub resource_group: String,
    pub workflow_name: String,
}

impl WorkflowRef {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        workflow_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            workflow_name: workflow_name.into(),
        }
    }

    /// ARM resource path, relative to the management API root
    pub fn resource_path(&self) -> String {
        format!(
            "subscriptions/{}/resourceGroups/{}/providers/Microsoft.Logic/workflows/{}",
            self.subscription_id, self.resource_group, self.workflow_name
        )
    }
}

impl std::fmt::Display for WorkflowRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_group, self.workflow_name)
    }
}

/// Extract the workflow a portal URL is showing.
///
/// The portal embeds the resource id as a percent-encoded segment after `/id/`.
/// Returns `None` when the URL does not address a Logic App.
pub fn extract_workflow_ref(url: &str) -> Option<WorkflowRef> {
    let encoded = ID_SEGMENT.captures(url)?.get(1)?.as_str();
    let decoded = percent_decode_str(encoded).decode_utf8_lossy();

    let captures = RESOURCE_PATH.captures(&decoded)?;
    let workflow = WorkflowRef::new(&captures[1], &captures[2], &captures[3]);
    log::debug!("Found workflow {} in page URL", workflow);
    Some(workflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PORTAL_URL: &str = "https://portal.azure.com/.../id/%2Fsubscriptions%2Fabc%2Fresourcegroups%2Frg1%2Fproviders%2FMicrosoft.Logic%2Fworkflows%2Fwf1";

    #[test]
    fn test_extract_encoded_segment() {
        let workflow = extract_workflow_ref(PORTAL_URL).unwrap();
        assert_eq!(workflow, WorkflowRef::new("abc", "rg1", "wf1"));
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let url = "https://portal.azure.com/#view/x/ID/%2fSUBSCRIPTIONS%2fabc%2fResourceGroups%2fRg1%2fproviders%2fmicrosoft.logic%2fworkflows%2fWf1";
        let workflow = extract_workflow_ref(url).unwrap();
        assert_eq!(workflow, WorkflowRef::new("abc", "Rg1", "Wf1"));
    }

    #[test]
    fn test_extract_unencoded_and_mixed_segments() {
        let plain = "https://portal.azure.com/#@t/resource/id/subscriptions/abc/resourcegroups/rg1/providers/Microsoft.Logic/workflows/wf1/logicApp";
        assert_eq!(
            extract_workflow_ref(plain),
            Some(WorkflowRef::new("abc", "rg1", "wf1"))
        );

        let mixed = "https://portal.azure.com/id/%2Fsubscriptions/abc%2Fresourcegroups%2Frg1/providers%2FMicrosoft.Logic%2Fworkflows%2Fwf1";
        assert_eq!(
            extract_workflow_ref(mixed),
            Some(WorkflowRef::new("abc", "rg1", "wf1"))
        );
    }

    #[test]
    fn test_trailing_query_is_not_part_of_name() {
        let url = "https://portal.azure.com/id/%2Fsubscriptions%2Fabc%2Fresourcegroups%2Frg1%2Fproviders%2FMicrosoft.Logic%2Fworkflows%2Fwf1?tab=designer";
        assert_eq!(extract_workflow_ref(url).unwrap().workflow_name, "wf1");
    }

    #[test]
    fn test_non_matching_urls_are_absent() {
        for url in [
            "",
            "https://portal.azure.com/#home",
            "https://portal.azure.com/id/%2Fsubscriptions%2Fabc%2FresourceGroups%2Frg1%2Fproviders%2FMicrosoft.Web%2Fsites%2Fapp",
            "https://portal.azure.com/id/%E0%A4%A",
            "::::",
        ] {
            assert_eq!(extract_workflow_ref(url), None, "{url}");
        }
    }

    #[test]
    fn test_resource_path() {
        let workflow = WorkflowRef::new("abc", "rg1", "wf1");
        assert_eq!(
            workflow.resource_path(),
            "subscriptions/abc/resourceGroups/rg1/providers/Microsoft.Logic/workflows/wf1"
        );
        assert_eq!(workflow.to_string(), "rg1/wf1");
    }
}
