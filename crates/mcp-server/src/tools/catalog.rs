#[derive(Clone, Copy, Debug)]
pub(crate) struct ToolDescriptor {
    pub(crate) name: &'static str,
    pub(crate) summary: &'static str,
}

pub(crate) const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "create_shard",
        summary: "Save a live window into a code region (upsert; re-creating refreshes health).",
    },
    ToolDescriptor {
        name: "view_shards",
        summary: "Resolve shards against current file content with health tracking (tag/file filter required).",
    },
    ToolDescriptor {
        name: "search_tags",
        summary: "Fuzzy-search tag names with shard counts.",
    },
    ToolDescriptor {
        name: "delete_tag",
        summary: "Remove a tag from all shards; shards left tagless are deleted.",
    },
];

pub(crate) fn tool_instructions() -> String {
    let mut lines = vec![
        "Memshard lets you save live windows into code instead of writing notes about it."
            .to_string(),
        "Shards resolve to current file content on every view; health tracks how far the code has drifted, and shards that stay stale are expired automatically.".to_string(),
        "Flow: create_shard while exploring, view_shards in later sessions, re-create shards that have degraded to refresh them.".to_string(),
        "Tips: use tags to organize shards; add a summary only when your interpretation beats the raw code.".to_string(),
        "Tools:".to_string(),
    ];
    for tool in TOOL_CATALOG {
        lines.push(format!("- {}: {}", tool.name, tool.summary));
    }
    lines.join("\n")
}
