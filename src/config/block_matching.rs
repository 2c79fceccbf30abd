use crate::pipeline::PipelineOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    pub left: PathBuf,
    pub right: PathBuf,
    /// Optional masks, valid where the pixel value is `> 0`.
    #[serde(default)]
    pub left_mask: Option<PathBuf>,
    #[serde(default)]
    pub right_mask: Option<PathBuf>,
    /// Required when `pipeline.matching.exploration` is `maps`.
    #[serde(default)]
    pub initial_disparity: Option<InitialDisparityConfig>,
    #[serde(default)]
    pub pipeline: PipelineOptions,
    pub output: RunOutputConfig,
}

/// Initial estimates stored as integer images. Disparities are recovered as
/// `raw * scale + offset` so negative values survive unsigned encodings.
#[derive(Debug, Deserialize)]
pub struct InitialDisparityConfig {
    pub hdisp: PathBuf,
    pub vdisp: PathBuf,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub offset: f32,
}

fn default_scale() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct RunOutputConfig {
    pub hdisp_image: PathBuf,
    pub vdisp_image: PathBuf,
    #[serde(default)]
    pub metric_image: Option<PathBuf>,
    #[serde(default)]
    pub mask_image: Option<PathBuf>,
    pub report_json: PathBuf,
}

pub fn load_config(path: &Path) -> Result<RunConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn parse_config(data: &str) -> Result<RunConfig, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Exploration;
    use crate::metric::MetricKind;
    use crate::subpixel::RefineMethod;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(
            r#"{
                "left": "l.png",
                "right": "r.png",
                "output": {
                    "hdisp_image": "out/h.png",
                    "vdisp_image": "out/v.png",
                    "report_json": "out/report.json"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.pipeline.matching.radius, 3);
        assert_eq!(cfg.pipeline.matching.metric, MetricKind::Ssd);
        assert_eq!(cfg.pipeline.subpixel.method, RefineMethod::Parabolic);
        assert!(cfg.pipeline.median.is_none());
        assert!(cfg.initial_disparity.is_none());
        assert!(cfg.output.metric_image.is_none());
    }

    #[test]
    fn nested_options_are_parsed() {
        let cfg = parse_config(
            r#"{
                "left": "l.png",
                "right": "r.png",
                "initial_disparity": { "hdisp": "h0.png", "vdisp": "v0.png", "offset": -128 },
                "pipeline": {
                    "matching": {
                        "radius": 2,
                        "min_hdisp": -5,
                        "max_hdisp": 7,
                        "metric": { "kind": "lp", "p": 1.5 },
                        "exploration": { "mode": "maps", "radius_x": 2, "radius_y": 0 }
                    },
                    "subpixel": { "method": "dichotomy" },
                    "median": { "radius": 1 },
                    "metric_threshold": 40.0
                },
                "output": {
                    "hdisp_image": "h.png",
                    "vdisp_image": "v.png",
                    "report_json": "r.json"
                }
            }"#,
        )
        .unwrap();
        let m = &cfg.pipeline.matching;
        assert_eq!((m.radius, m.min_hdisp, m.max_hdisp), (2, -5, 7));
        assert_eq!(m.metric, MetricKind::Lp { p: 1.5 });
        assert!(matches!(
            m.exploration,
            Exploration::Maps {
                radius_x: 2,
                radius_y: 0
            }
        ));
        assert_eq!(cfg.pipeline.subpixel.method, RefineMethod::Dichotomy);
        assert_eq!(cfg.pipeline.median.map(|o| o.radius), Some(1));
        assert_eq!(cfg.pipeline.metric_threshold, Some(40.0));
        let init = cfg.initial_disparity.unwrap();
        assert_eq!((init.scale, init.offset), (1.0, -128.0));
    }
}
