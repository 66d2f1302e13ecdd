//! Notion block model and the page layouts built from [`DailyBranchData`].

use serde_json::{Value, json};

use crate::material::{BranchMaterial, DailyBranchData};

/// Notion's limit on a single rich text object's content.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Code longer than this many characters is cut.
pub const MAX_CODE_CHARS: usize = 2000;

const CODE_TRUNCATION_MARKER: &str = "\n// ... (truncated)";
const MAX_COMMIT_LINKS: usize = 5;
const MAX_CODE_EXAMPLES: usize = 3;

/// Languages Notion accepts on code blocks.
const NOTION_CODE_LANGUAGES: &[&str] = &[
    "abap", "arduino", "bash", "basic", "c", "clojure", "coffeescript", "cpp", "csharp", "css",
    "dart", "diff", "docker", "elixir", "elm", "erlang", "flow", "fortran", "fsharp", "gherkin",
    "glsl", "go", "graphql", "groovy", "haskell", "html", "java", "javascript", "json", "julia",
    "kotlin", "latex", "less", "lisp", "livescript", "lua", "makefile", "markdown", "markup",
    "matlab", "mermaid", "nix", "objective-c", "ocaml", "pascal", "perl", "php", "plain text",
    "powershell", "prolog", "protobuf", "python", "r", "reason", "ruby", "rust", "sass", "scala",
    "scheme", "scss", "shell", "sql", "swift", "typescript", "vb.net", "verilog", "vhdl",
    "visual basic", "webassembly", "xml", "yaml", "java/c/c++/c#",
];

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub link: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            link: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            ..Self::plain(text)
        }
    }
}

/// A block of page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading1(Vec<Span>),
    Heading2(Vec<Span>),
    Heading3(Vec<Span>),
    Paragraph(Vec<Span>),
    Bullet(Vec<Span>),
    Code {
        language: String,
        content: String,
        caption: Option<String>,
    },
    Callout { spans: Vec<Span>, emoji: String },
    Divider,
    LinkPreview(String),
}

pub fn heading1(text: impl Into<String>) -> Block {
    Block::Heading1(vec![Span::plain(text)])
}

pub fn heading2(text: impl Into<String>) -> Block {
    Block::Heading2(vec![Span::plain(text)])
}

pub fn heading3(text: impl Into<String>) -> Block {
    Block::Heading3(vec![Span::plain(text)])
}

pub fn paragraph(text: impl Into<String>) -> Block {
    Block::Paragraph(vec![Span::plain(text)])
}

pub fn bullet(text: impl Into<String>) -> Block {
    Block::Bullet(vec![Span::plain(text)])
}

/// `label` in bold followed by `: value`.
fn labeled(label: &str, value: &str) -> Vec<Span> {
    vec![Span::bold(label), Span::plain(format!(": {}", value))]
}

/// Code block with a Notion language tag and length cap applied.
pub fn code(content: &str, language: &str, caption: Option<&str>) -> Block {
    let content = match content.char_indices().nth(MAX_CODE_CHARS) {
        Some((cut, _)) => format!("{}{}", &content[..cut], CODE_TRUNCATION_MARKER),
        None => content.to_string(),
    };
    Block::Code {
        language: notion_code_language(language).to_string(),
        content,
        caption: caption.map(str::to_string),
    }
}

/// Map a detected language to one Notion accepts, `plain text` otherwise.
pub fn notion_code_language(language: &str) -> &'static str {
    let normalized = match language {
        "ts" | "tsx" => "typescript",
        "js" | "jsx" => "javascript",
        "py" => "python",
        "rb" => "ruby",
        "sh" => "shell",
        "yml" => "yaml",
        "text" => "plain text",
        other => other,
    };

    NOTION_CODE_LANGUAGES
        .iter()
        .find(|l| **l == normalized)
        .copied()
        .unwrap_or("plain text")
}

fn rich_text(spans: &[Span]) -> Value {
    let mut objects = Vec::new();

    for span in spans {
        let chars: Vec<char> = span.text.chars().collect();
        for chunk in chars.chunks(MAX_TEXT_CHARS) {
            let content: String = chunk.iter().collect();
            let mut text = json!({ "content": content });
            if let Some(url) = &span.link {
                text["link"] = json!({ "url": url });
            }
            let mut object = json!({ "type": "text", "text": text });
            if span.bold {
                object["annotations"] = json!({ "bold": true });
            }
            objects.push(object);
        }
    }

    Value::Array(objects)
}

impl Block {
    /// The block as a Notion API block object.
    pub fn to_json(&self) -> Value {
        let (kind, body) = match self {
            Block::Heading1(spans) => ("heading_1", json!({ "rich_text": rich_text(spans) })),
            Block::Heading2(spans) => ("heading_2", json!({ "rich_text": rich_text(spans) })),
            Block::Heading3(spans) => ("heading_3", json!({ "rich_text": rich_text(spans) })),
            Block::Paragraph(spans) => ("paragraph", json!({ "rich_text": rich_text(spans) })),
            Block::Bullet(spans) => (
                "bulleted_list_item",
                json!({ "rich_text": rich_text(spans) }),
            ),
            Block::Code {
                language,
                content,
                caption,
            } => {
                let mut body = json!({
                    "rich_text": rich_text(&[Span::plain(content.as_str())]),
                    "language": language,
                });
                if let Some(caption) = caption {
                    body["caption"] = rich_text(&[Span::plain(caption.as_str())]);
                }
                ("code", body)
            }
            Block::Callout { spans, emoji } => (
                "callout",
                json!({
                    "rich_text": rich_text(spans),
                    "icon": { "type": "emoji", "emoji": emoji },
                }),
            ),
            Block::Divider => ("divider", json!({})),
            Block::LinkPreview(url) => ("link_preview", json!({ "url": url })),
        };

        let mut block = json!({ "object": "block", "type": kind });
        block[kind] = body;
        block
    }
}

/// Blocks for one branch's material, ending with a divider.
pub fn branch_material_blocks(branch: &BranchMaterial, workspace: Option<&str>) -> Vec<Block> {
    let title = match workspace {
        Some(ws) => format!("📌 [{}] {}", ws, branch.name),
        None => format!("📌 {}", branch.name),
    };
    let mut blocks = vec![heading3(title)];

    if !branch.requirements.is_empty() {
        blocks.push(Block::Paragraph(labeled("요구사항", &branch.requirements)));
    }

    if !branch.tech.is_empty() {
        blocks.push(Block::Bullet(labeled("주요 기술", &branch.tech.join(", "))));
    }

    if let Some(pr_url) = branch.pr_url.as_deref().filter(|u| !u.is_empty()) {
        let number = pr_url.rsplit('/').next().unwrap_or(pr_url);
        blocks.push(Block::Paragraph(vec![
            Span::plain("🔗 "),
            Span::bold("PR"),
            Span::plain(": "),
            Span::link(format!("#{}", number), pr_url),
        ]));
        blocks.push(Block::LinkPreview(pr_url.to_string()));
    }

    let linked_commits: Vec<_> = branch
        .commit_urls
        .iter()
        .filter(|c| !c.url.is_empty())
        .take(MAX_COMMIT_LINKS)
        .collect();
    if !linked_commits.is_empty() {
        blocks.push(heading3("🔗 커밋"));
        for commit in linked_commits {
            blocks.push(Block::Bullet(vec![Span::link(
                commit.hash.as_str(),
                commit.url.as_str(),
            )]));
        }
    }

    if !branch.code_blocks.is_empty() {
        blocks.push(heading3("코드 예제"));
        for snippet in branch.code_blocks.iter().take(MAX_CODE_EXAMPLES) {
            if !snippet.description.is_empty() {
                blocks.push(paragraph(snippet.description.as_str()));
            }
            blocks.push(code(
                &snippet.example_code,
                &snippet.language,
                snippet.file_path.as_deref(),
            ));
        }
    }

    if !branch.troubleshooting.is_empty() {
        blocks.push(heading3("🔧 트러블슈팅"));
        for item in &branch.troubleshooting {
            blocks.push(Block::Callout {
                spans: labeled("문제", &item.problem),
                emoji: "⚠️".to_string(),
            });
            blocks.push(Block::Bullet(labeled("원인", &item.cause)));
            blocks.push(Block::Bullet(labeled("해결", &item.solution)));
        }
    }

    if !branch.learnings.is_empty() {
        blocks.push(heading3("💡 배운 점"));
        blocks.extend(branch.learnings.iter().map(|l| bullet(l.as_str())));
    }

    if !branch.blog_idea_title.is_empty() {
        blocks.push(Block::Callout {
            spans: labeled("초안 포스트 아이디어", &branch.blog_idea_title),
            emoji: "📝".to_string(),
        });
    }

    if let Some(draft) = &branch.llm_draft {
        blocks.push(heading3("📝 블로그 초안"));
        blocks.push(Block::Paragraph(labeled("제목", &draft.title)));

        if !draft.key_points.is_empty() {
            blocks.push(Block::Paragraph(vec![Span::bold("핵심 포인트"), Span::plain(":")]));
            blocks.extend(draft.key_points.iter().map(|p| bullet(p.as_str())));
        }

        if !draft.code_explanation.is_empty() {
            blocks.push(Block::Paragraph(labeled("코드 설명", &draft.code_explanation)));
        }
    }

    blocks.push(Block::Divider);
    blocks
}

/// Summary, idea list and per-branch sections shared by both layouts.
fn daily_sections(data: &DailyBranchData, workspace: Option<&str>) -> Vec<Block> {
    let mut blocks = vec![paragraph(data.summary.as_str()), Block::Divider];

    blocks.push(heading2("📝 기술 블로그 소재 목록"));
    for idea in &data.blog_ideas {
        blocks.push(Block::Bullet(vec![
            Span::bold(idea.title.as_str()),
            Span::plain(format!(": {} [{}]", idea.description, idea.tags.join(", "))),
        ]));
    }
    blocks.push(Block::Divider);

    blocks.push(heading2("🔍 브랜치별 상세 재료"));
    for branch in &data.branches {
        blocks.extend(branch_material_blocks(branch, workspace));
    }

    blocks
}

/// Content of a freshly created page.
pub fn build_blocks_for_new(data: &DailyBranchData, workspace: Option<&str>) -> Vec<Block> {
    let title = match workspace {
        Some(ws) => format!("📌 [{}] {} 작업", ws, data.daily_branch),
        None => format!("📌 {} 작업 총정리", data.daily_branch),
    };

    let mut blocks = vec![heading1(title)];
    blocks.extend(daily_sections(data, workspace));
    blocks
}

/// Content appended to an existing page for the same date.
pub fn build_blocks_for_append(data: &DailyBranchData, workspace: &str) -> Vec<Block> {
    let mut blocks = vec![
        Block::Divider,
        heading1(format!("📌 [{}] {} 작업", workspace, data.daily_branch)),
    ];
    blocks.extend(daily_sections(data, Some(workspace)));
    blocks
}
