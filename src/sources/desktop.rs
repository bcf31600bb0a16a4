use crate::sources::Source;
use directories::BaseDirs;
use log::{debug, info};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

const MAIN_CATEGORIES: &[&str] = &[
    "AudioVideo", "Audio", "Video", "Development", "Education", "Game", "Graphics",
    "Network", "Office", "Science", "Settings", "System", "Utility",
];

const OTHER_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub name: String,
    pub exec: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    Category { name: String, children: Vec<MenuNode> },
    Entry(MenuEntry),
}

/// Read-only application menu tree, searched depth-first.
#[derive(Debug, Clone, Default)]
pub struct MenuIndex {
    root: Vec<MenuNode>,
}

impl MenuIndex {
    pub fn new(root: Vec<MenuNode>) -> Self {
        Self { root }
    }

    /// Display names of every leaf, depth-first.
    pub fn entries(&self) -> Vec<String> {
        self.leaves().into_iter().map(|e| e.name.clone()).collect()
    }

    /// Sanitized command of the first leaf named `name`.
    pub fn exec_for(&self, name: &str) -> Option<String> {
        self.leaves()
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| sanitize_exec(&e.exec))
    }

    fn leaves(&self) -> Vec<&MenuEntry> {
        fn walk<'a>(nodes: &'a [MenuNode], out: &mut Vec<&'a MenuEntry>) {
            for node in nodes {
                match node {
                    MenuNode::Category { children, .. } => walk(children, out),
                    MenuNode::Entry(entry) => out.push(entry),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

impl Source for MenuIndex {
    fn items(&self) -> Vec<String> {
        self.entries()
    }
}

fn field_codes() -> &'static Regex {
    static FIELD_CODES: OnceLock<Regex> = OnceLock::new();
    FIELD_CODES.get_or_init(|| Regex::new(r"%%|%[dDnNvmuUfFcik]").expect("field code pattern"))
}

/// Drop desktop-entry field codes from an `Exec` value and trim it.
///
/// `%d %D %n %N %v %m` are deprecated and `%u %U %f %F %c %i %k` need context
/// we never supply, so all of them go. An escaped `%%` is left alone.
pub fn sanitize_exec(exec: &str) -> String {
    field_codes()
        .replace_all(exec, |caps: &Captures| {
            if &caps[0] == "%%" { "%%".to_string() } else { String::new() }
        })
        .trim()
        .to_string()
}

/// Builds a [`MenuIndex`] from `.desktop` files under a list of application directories.
pub struct DesktopSource {
    dirs: Vec<PathBuf>,
}

impl DesktopSource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// `$XDG_DATA_HOME/applications` followed by each `$XDG_DATA_DIRS/applications`.
    pub fn default_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(base_dirs) = BaseDirs::new() {
            dirs.push(base_dirs.data_dir().join("applications"));
        }
        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        dirs.extend(data_dirs.split(':').filter(|d| !d.is_empty()).map(|d| Path::new(d).join("applications")));
        dirs
    }

    pub fn scan(&self) -> MenuIndex {
        let mut seen_ids = HashSet::new();
        let mut categories: BTreeMap<String, Vec<MenuEntry>> = BTreeMap::new();

        for dir in &self.dirs {
            if !dir.exists() {
                continue;
            }
            debug!("Scanning desktop files in {:?}", dir);
            for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name().into_iter().flatten() {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("desktop") {
                    continue;
                }
                // Earlier directories shadow later ones by desktop-file id.
                let id = desktop_id(dir, path);
                if !seen_ids.insert(id) {
                    continue;
                }
                let Ok(content) = fs::read_to_string(path) else {
                    continue;
                };
                if let Some(parsed) = parse_desktop_file(&content) {
                    categories
                        .entry(parsed.category)
                        .or_default()
                        .push(MenuEntry { name: parsed.name, exec: parsed.exec });
                }
            }
        }

        let root: Vec<MenuNode> = categories
            .into_iter()
            .map(|(name, mut entries)| {
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                MenuNode::Category { name, children: entries.into_iter().map(MenuNode::Entry).collect() }
            })
            .collect();
        for node in &root {
            if let MenuNode::Category { name, children } = node {
                debug!("Menu category {}: {} entries", name, children.len());
            }
        }
        let index = MenuIndex::new(root);
        info!("DesktopSource: found {} entries", index.leaves().len());
        index
    }
}

fn desktop_id(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, PartialEq)]
struct ParsedEntry {
    name: String,
    exec: String,
    category: String,
}

fn parse_desktop_file(content: &str) -> Option<ParsedEntry> {
    let mut name = None;
    let mut exec = None;
    let mut categories = None;
    let mut hidden = false;
    let mut is_application = true;
    let mut is_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        if line == "[Desktop Entry]" {
            is_desktop_entry = true;
            continue;
        }

        if line.starts_with('[') {
            is_desktop_entry = false;
            continue;
        }

        if !is_desktop_entry { continue; }

        let Some((key, value)) = line.split_once('=') else { continue };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(value.to_string()),
            "Exec" => exec = Some(value.to_string()),
            "Categories" => categories = Some(value.to_string()),
            "Type" => is_application = value == "Application",
            "NoDisplay" | "Hidden" => hidden |= value == "true",
            _ => {}
        }
    }

    if hidden || !is_application { return None; }

    let category = categories
        .as_deref()
        .and_then(|c| c.split(';').find(|c| MAIN_CATEGORIES.contains(c)))
        .unwrap_or(OTHER_CATEGORY)
        .to_string();

    match (name, exec) {
        (Some(name), Some(exec)) => Some(ParsedEntry { name, exec, category }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn leaf(name: &str, exec: &str) -> MenuNode {
        MenuNode::Entry(MenuEntry { name: name.to_string(), exec: exec.to_string() })
    }

    fn category(name: &str, children: Vec<MenuNode>) -> MenuNode {
        MenuNode::Category { name: name.to_string(), children }
    }

    #[test]
    fn strips_every_field_code() {
        assert_eq!(sanitize_exec("gimp-2.6 %U"), "gimp-2.6");
        assert_eq!(sanitize_exec("  foo %f --name %c %i %k "), "foo  --name");
        assert_eq!(sanitize_exec("%d%D%n%N%v%mapp"), "app");
        assert_eq!(sanitize_exec("printf 100%%"), "printf 100%%");
        assert_eq!(sanitize_exec("plain"), "plain");
    }

    #[test]
    fn flattens_depth_first_and_finds_first_match() {
        let index = MenuIndex::new(vec![
            category("Games", vec![leaf("Mines", "gnome-mines"), category("Cards", vec![leaf("Solitaire", "sol %u")])]),
            leaf("Calculator", "gnome-calculator"),
            category("Graphics", vec![leaf("Solitaire", "other-sol")]),
        ]);

        assert_eq!(index.entries(), vec!["Mines", "Solitaire", "Calculator", "Solitaire"]);
        assert_eq!(index.exec_for("Solitaire"), Some("sol".to_string()));
        assert_eq!(index.exec_for("Calculator"), Some("gnome-calculator".to_string()));
        assert_eq!(index.exec_for("Terminal"), None);
    }

    #[test]
    fn parses_application_entries_only() {
        let gimp = "[Desktop Entry]\nType=Application\nName=GIMP Image Editor\nName[de]=GIMP\nExec=gimp-2.6 %U\nCategories=Graphics;2DGraphics;\n[Desktop Action new]\nName=New\n";
        assert_eq!(
            parse_desktop_file(gimp),
            Some(ParsedEntry {
                name: "GIMP Image Editor".to_string(),
                exec: "gimp-2.6 %U".to_string(),
                category: "Graphics".to_string(),
            })
        );

        assert_eq!(parse_desktop_file("[Desktop Entry]\nName=Hidden\nExec=x\nNoDisplay=true\n"), None);
        assert_eq!(parse_desktop_file("[Desktop Entry]\nName=Site\nType=Link\nURL=http://x\n"), None);
        assert_eq!(
            parse_desktop_file("[Desktop Entry]\nName=Tool\nExec=tool\n").map(|e| e.category),
            Some("Other".to_string())
        );
    }

    #[test]
    fn scan_groups_by_category_and_shadows_by_id() {
        let user = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        fs::write(user.path().join("calc.desktop"), "[Desktop Entry]\nName=Calculator\nExec=my-calc\nCategories=Utility;\n").unwrap();
        fs::write(system.path().join("calc.desktop"), "[Desktop Entry]\nName=Calculator\nExec=gnome-calculator\nCategories=Utility;\n").unwrap();
        fs::create_dir(system.path().join("kde")).unwrap();
        fs::write(system.path().join("kde").join("konsole.desktop"), "[Desktop Entry]\nName=Konsole\nExec=konsole\nCategories=System;\n").unwrap();
        fs::write(system.path().join("notes.txt"), "not a desktop file").unwrap();

        let index = DesktopSource::new(vec![user.path().to_path_buf(), system.path().to_path_buf()]).scan();

        assert_eq!(index.entries(), vec!["Konsole", "Calculator"]);
        assert_eq!(index.exec_for("Calculator"), Some("my-calc".to_string()));
    }

    proptest! {
        #[test]
        fn sanitizing_is_idempotent(
            parts in proptest::collection::vec(
                prop_oneof![
                    Just("%d"), Just("%D"), Just("%n"), Just("%N"), Just("%v"), Just("%m"),
                    Just("%u"), Just("%U"), Just("%f"), Just("%F"), Just("%c"), Just("%i"),
                    Just("%k"), Just("%"), Just(" "), Just("app"), Just("--flag"), Just("f"),
                ],
                0..12,
            )
        ) {
            let exec = parts.concat();
            let once = sanitize_exec(&exec);
            prop_assert_eq!(sanitize_exec(&once), once.clone());
            prop_assert_eq!(once.trim(), once.as_str());
        }
    }
}
