//! Root page handler - search, bulk search and export

use crate::AppState;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};

/// GET /
pub async fn root_page(State(state): State<AppState>) -> impl IntoResponse {
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_profile = env!("BUILD_PROFILE");

    let sources = state.pipeline.source_ids().join(", ");
    let mode_badge = if state.config.demo_mode {
        r#"<span class="badge demo">DEMO MODE</span>"#
    } else {
        r#"<span class="badge live">LIVE</span>"#
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Product Spec Finder</title>
    <link rel="stylesheet" href="/static/psf.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>Product Spec Finder {mode_badge}</h1>
                <div class="subtitle">Sources (priority order): {sources}</div>
            </div>
            <div class="header-right">
                <div class="build-info-line">v{version} [{git_hash}]</div>
                <div class="build-info-line">{build_timestamp}</div>
                <div class="build-info-line">({build_profile})</div>
            </div>
        </div>
    </header>

    <main class="container">
        <section class="card">
            <h2>Search</h2>
            <form id="search-form">
                <input id="query" type="text" placeholder="Product name, model number or GTIN" autocomplete="off">
                <select id="kind">
                    <option value="">Auto-detect</option>
                    <option value="name">Product name</option>
                    <option value="model">Model number</option>
                    <option value="article_number">Article number (GTIN)</option>
                </select>
                <button type="submit">Search</button>
            </form>
            <div id="search-status" class="status"></div>
        </section>

        <section class="card">
            <h2>Bulk search</h2>
            <p class="hint">One query per line, or a JSON array. Up to {batch_limit} queries.</p>
            <textarea id="bulk-input" rows="6" placeholder="iPhone 15 Pro&#10;Dell P2422H&#10;0194253401735"></textarea>
            <button id="bulk-run">Run bulk search</button>
            <button id="bulk-export" disabled>Export bulk CSV</button>
            <div id="bulk-status" class="status"></div>
        </section>

        <section class="card">
            <h2>Results <span id="result-count">(0)</span></h2>
            <div class="actions">
                <button id="export-json" disabled>Export JSON</button>
                <button id="export-csv" disabled>Export CSV</button>
                <button id="clear-results" disabled>Clear</button>
            </div>
            <div id="results"></div>
        </section>
    </main>

    <script src="/static/psf.js"></script>
</body>
</html>
"#,
        mode_badge = mode_badge,
        sources = if sources.is_empty() { "none" } else { sources.as_str() },
        version = version,
        git_hash = git_hash,
        build_timestamp = build_timestamp,
        build_profile = build_profile,
        batch_limit = state.config.batch_limit,
    );

    Html(html)
}
