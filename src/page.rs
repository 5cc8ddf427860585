//! Server-rendered form and result page.

use crate::aggregate::Aggregate;

const PAGE_NA: &str = "Data Not Available";

#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub error: Option<String>,
    pub result: Option<ResultView>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResultView {
    pub score: u8,
    pub roof: String,
    pub walls: String,
    pub door: String,
    pub description: String,
    pub download_url: String,
}

impl ResultView {
    pub fn new(agg: &Aggregate, download_url: String) -> Self {
        let show = |v: Option<u8>| v.map(|s| s.to_string()).unwrap_or_else(|| PAGE_NA.into());
        Self {
            score: agg.overall,
            roof: show(agg.roof),
            walls: show(agg.wall),
            door: show(agg.door),
            description: agg.description.clone(),
            download_url,
        }
    }
}

impl PageView {
    pub fn error(msg: impl Into<String>, skipped: Vec<String>) -> Self {
        Self {
            error: Some(msg.into()),
            result: None,
            skipped,
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(view: &PageView) -> String {
    let mut body = String::new();

    if let Some(err) = &view.error {
        body.push_str(&format!(
            "<div class=\"error\">{}</div>\n",
            escape_html(err)
        ));
    }

    if let Some(r) = &view.result {
        body.push_str(&format!(
            concat!(
                "<section class=\"result\">\n",
                "<h2>Overall GraminScore: <span class=\"score\">{score}</span>/100</h2>\n",
                "<ul class=\"components\">\n",
                "<li>Walls: {walls}</li>\n",
                "<li>Roof: {roof}</li>\n",
                "<li>Door: {door}</li>\n",
                "</ul>\n",
                "<p class=\"desc\">{desc}</p>\n",
                "<a class=\"download\" href=\"{url}\">Download PDF report</a>\n",
                "</section>\n"
            ),
            score = r.score,
            walls = escape_html(&r.walls),
            roof = escape_html(&r.roof),
            door = escape_html(&r.door),
            desc = escape_html(&r.description),
            url = escape_html(&r.download_url),
        ));
    }

    if !view.skipped.is_empty() {
        body.push_str("<section class=\"skipped\">\n<h3>Skipped files</h3>\n<ul>\n");
        for s in &view.skipped {
            body.push_str(&format!("<li>{}</li>\n", escape_html(s)));
        }
        body.push_str("</ul>\n</section>\n");
    }

    format!(
        concat!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<title>GraminScore</title>\n",
            "<link rel=\"stylesheet\" href=\"/static/style.css\">\n",
            "</head>\n<body>\n<main>\n",
            "<h1>GraminScore</h1>\n",
            "<p>Upload photos of a house exterior (roof, walls, doors) to get a condition score.</p>\n",
            "<form id=\"analyzeForm\" action=\"/analyze\" method=\"post\" enctype=\"multipart/form-data\">\n",
            "<label id=\"dropZone\" class=\"drop-zone\">\n",
            "<input id=\"fileInput\" type=\"file\" name=\"images\" accept=\".jpg,.jpeg,.png,.webp\" multiple>\n",
            "<span>Drop images here or click to browse</span>\n",
            "</label>\n",
            "<div id=\"filePreview\"></div>\n",
            "<button id=\"submitBtn\" type=\"submit\">Analyze</button>\n",
            "<div id=\"loadingOverlay\" class=\"hidden\">Analyzing&hellip;</div>\n",
            "</form>\n",
            "{body}",
            "</main>\n",
            "<script src=\"/static/main.js\"></script>\n",
            "</body>\n</html>\n"
        ),
        body = body
    )
}
