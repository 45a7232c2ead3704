use galleryconfig::ViewerSettings;
use serde::Serialize;

pub const DEFAULT_CANVAS_ID: &str = "unity-canvas";

/// Drawable surface the viewer renders into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountTarget {
    pub canvas_id: String,
    pub width: u32,
    pub height: u32,
}

impl Default for MountTarget {
    fn default() -> Self {
        Self {
            canvas_id: DEFAULT_CANVAS_ID.to_string(),
            width: 960,
            height: 600,
        }
    }
}

impl MountTarget {
    pub fn from_settings(settings: &ViewerSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            ..Self::default()
        }
    }
}

/// Configuration object handed to the loader script, serialised in the
/// camelCase shape the loader reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    #[serde(skip)]
    pub loader_url: String,
    pub data_url: String,
    pub framework_url: String,
    pub code_url: String,
    pub streaming_assets_url: String,
    pub company_name: String,
    pub product_name: String,
    pub product_version: String,
    pub device_pixel_ratio: f32,
    #[serde(rename = "matchWebGLToCanvasSize")]
    pub match_webgl_to_canvas_size: bool,
    pub canvas_id: String,
}

impl LoaderConfig {
    pub fn from_build(build_path: &str, build_name: &str) -> Self {
        let base = build_path.trim().trim_end_matches('/');
        let name = build_name.trim();
        let artifact = |suffix: &str| {
            if base.is_empty() {
                format!("{name}.{suffix}")
            } else {
                format!("{base}/{name}.{suffix}")
            }
        };
        Self {
            loader_url: artifact("loader.js"),
            data_url: artifact("data"),
            framework_url: artifact("framework.js"),
            code_url: artifact("wasm"),
            streaming_assets_url: "StreamingAssets".to_string(),
            company_name: "MyCompany".to_string(),
            product_name: "MyUnityApp".to_string(),
            product_version: "1.0".to_string(),
            device_pixel_ratio: 1.0,
            // The canvas keeps the size chosen by the host.
            match_webgl_to_canvas_size: false,
            canvas_id: DEFAULT_CANVAS_ID.to_string(),
        }
    }

    pub fn from_settings(settings: &ViewerSettings, target: &MountTarget) -> Self {
        let mut config = Self::from_build(&settings.build_path, &settings.build_name);
        config.company_name = settings.company_name.clone();
        config.product_name = settings.product_name.clone();
        config.product_version = settings.product_version.clone();
        config.canvas_id = target.canvas_id.clone();
        config
    }

    /// Every artifact the loader fetches, loader script first.
    pub fn artifact_urls(&self) -> [&str; 4] {
        [
            self.loader_url.as_str(),
            self.data_url.as_str(),
            self.framework_url.as_str(),
            self.code_url.as_str(),
        ]
    }
}
