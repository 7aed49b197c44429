//! Catalog-path resolver.
//!
//! Turns a catalog-relative path into a backing-store path under the assets
//! root, refusing absolute paths and root escapes unless explicitly allowed.

use lodestone_io::path;

use crate::error::{AssetError, AssetErrorCode, AssetResult};

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub assets_root: String,
    pub allow_absolute_path: bool,
    pub allow_escape_assets_root: bool,
    pub normalize_separators: bool,
    pub squash_slashes: bool,
    /// Strip `asset://`-style schemes before resolving.
    pub allow_schemes: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            assets_root: "assets".to_string(),
            allow_absolute_path: false,
            allow_escape_assets_root: false,
            normalize_separators: true,
            squash_slashes: true,
            allow_schemes: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssetPathResolver {
    opt: ResolverOptions,
}

impl AssetPathResolver {
    pub fn new(opt: ResolverOptions) -> Self {
        Self { opt }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.opt
    }

    pub fn set_options(&mut self, opt: ResolverOptions) {
        self.opt = opt;
    }

    /// Normalization only, for callers that want the textual cleanup without
    /// root joining.
    pub fn normalize_path(path_str: &str, normalize_separators: bool, squash_slashes: bool) -> String {
        path::normalize_slashes(path_str, normalize_separators, squash_slashes)
    }

    pub fn resolve(&self, catalog_path: &str) -> AssetResult<String> {
        if catalog_path.is_empty() {
            return Err(AssetError::with_detail(
                AssetErrorCode::InvalidPath,
                "AssetPathResolver: empty path",
                catalog_path,
            ));
        }

        // 1) strip scheme (asset://, res://, ...)
        let p = if self.opt.allow_schemes {
            let (stripped, _) = path::strip_scheme_loose(catalog_path);
            stripped
        } else {
            catalog_path.to_string()
        };

        // 2) separators and repeated slashes
        let p = path::normalize_slashes(&p, self.opt.normalize_separators, self.opt.squash_slashes);

        // 3) absolute paths bypass the root entirely, so they are opt-in
        if path::is_absolute_path_like(&p) {
            if !self.opt.allow_absolute_path {
                return Err(AssetError::with_detail(
                    AssetErrorCode::InvalidPath,
                    "AssetPathResolver: absolute path is not allowed",
                    catalog_path,
                ));
            }
            let (cleaned, _) = path::remove_dot_segments(&p);
            return Ok(cleaned);
        }

        // 4) join under the assets root
        let joined = path::join_root_and_relative(&self.opt.assets_root, &p);
        let joined =
            path::normalize_slashes(&joined, self.opt.normalize_separators, self.opt.squash_slashes);

        // 5) resolve dot segments; escaping the root is the one thing the
        //    resolver exists to stop. A '..' can consume root segments
        //    without underflowing the stack, so the boundary is checked
        //    textually as well.
        let (cleaned, escaped_above_root) = path::remove_dot_segments(&joined);
        let escaped = escaped_above_root || !self.lies_under_root(&cleaned);
        if escaped && !self.opt.allow_escape_assets_root {
            return Err(AssetError::with_detail(
                AssetErrorCode::PathEscapesRoot,
                "AssetPathResolver: path escapes assets root via '..'",
                catalog_path,
            ));
        }

        Ok(cleaned)
    }

    fn lies_under_root(&self, cleaned: &str) -> bool {
        let root = if self.opt.assets_root.is_empty() {
            "assets"
        } else {
            &self.opt.assets_root
        };
        let root =
            path::normalize_slashes(root, self.opt.normalize_separators, self.opt.squash_slashes);
        let (root_clean, _) = path::remove_dot_segments(root.trim_end_matches('/'));

        cleaned == root_clean
            || cleaned
                .strip_prefix(&root_clean)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
