//! Request renderers for parameter groups.
//!
//! Renderers turn the walker's parameter groups into archive requests. Each
//! group is an independent alternative and becomes its own request.

use crate::config::SoarConfig;
use crate::error::RenderError;
use crate::walker::ParamGroup;

/// Output from rendering one parameter group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    /// The ADQL query text, in the archive's `+`-for-space form
    pub adql: String,
    /// Full request URL for the synchronous TAP endpoint
    pub url: String,
}

/// Trait for rendering parameter groups to a target request format.
pub trait QueryRenderer: Send + Sync {
    /// Unique name for this renderer
    fn name(&self) -> &str;

    /// Render every group; one query per group
    fn render(&self, groups: &[ParamGroup]) -> Result<Vec<RenderedQuery>, RenderError>;
}

/// Renders groups as ADQL `SELECT` queries against the data item table.
#[derive(Debug, Clone)]
pub struct AdqlRenderer {
    /// TAP endpoint
    pub tap_url: String,
    /// Table to select from
    pub data_table: String,
}

impl Default for AdqlRenderer {
    fn default() -> Self {
        Self::from_config(&SoarConfig::default())
    }
}

impl AdqlRenderer {
    pub fn from_config(config: &SoarConfig) -> Self {
        Self {
            tap_url: config.tap_url.clone(),
            data_table: config.data_table.clone(),
        }
    }

    /// ADQL text for a single group.
    ///
    /// The parameters are already archive-escaped, so nothing is URL-encoded.
    pub fn adql(&self, params: &[String]) -> String {
        format!(
            "SELECT+*+FROM+{}+WHERE+{}",
            self.data_table,
            params.join("+AND+")
        )
    }

    /// Synchronous TAP request URL for a single group.
    pub fn request_url(&self, adql: &str) -> String {
        format!(
            "{}?REQUEST=doQuery&LANG=ADQL&FORMAT=json&QUERY={}",
            self.tap_url, adql
        )
    }
}

impl QueryRenderer for AdqlRenderer {
    fn name(&self) -> &str {
        "adql"
    }

    fn render(&self, groups: &[ParamGroup]) -> Result<Vec<RenderedQuery>, RenderError> {
        groups
            .iter()
            .enumerate()
            .map(|(index, params)| {
                if params.is_empty() {
                    return Err(RenderError::EmptyGroup { index });
                }
                let adql = self.adql(params);
                let url = self.request_url(&adql);
                Ok(RenderedQuery { adql, url })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(params: &[&str]) -> ParamGroup {
        params.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_single_group() {
        let renderer = AdqlRenderer::default();
        let queries = renderer
            .render(&[group(&["instrument='EUI'", "level='L2'"])])
            .unwrap();

        assert_eq!(queries.len(), 1);
        assert_eq!(
            queries[0].adql,
            "SELECT+*+FROM+v_sc_data_item+WHERE+instrument='EUI'+AND+level='L2'"
        );
        assert_eq!(
            queries[0].url,
            "http://soar.esac.esa.int/soar-sl-tap/tap/sync?REQUEST=doQuery&LANG=ADQL&FORMAT=json&QUERY=SELECT+*+FROM+v_sc_data_item+WHERE+instrument='EUI'+AND+level='L2'"
        );
    }

    #[test]
    fn test_one_query_per_group() {
        let renderer = AdqlRenderer::default();
        let queries = renderer
            .render(&[group(&["instrument='EUI'"]), group(&["instrument='MAG'"])])
            .unwrap();

        assert_eq!(queries.len(), 2);
        assert!(queries[1].adql.ends_with("WHERE+instrument='MAG'"));
    }

    #[test]
    fn test_configured_table() {
        let config = SoarConfig {
            data_table: "v_ll_data_item".to_string(),
            ..SoarConfig::default()
        };
        let renderer = AdqlRenderer::from_config(&config);

        assert_eq!(
            renderer.adql(&group(&["level='LL02'"])),
            "SELECT+*+FROM+v_ll_data_item+WHERE+level='LL02'"
        );
    }

    #[test]
    fn test_empty_group_is_rejected() {
        let renderer = AdqlRenderer::default();
        let result = renderer.render(&[group(&["level='L1'"]), ParamGroup::new()]);

        assert_eq!(result, Err(RenderError::EmptyGroup { index: 1 }));
    }

    #[test]
    fn test_renderer_name() {
        assert_eq!(AdqlRenderer::default().name(), "adql");
    }
}
