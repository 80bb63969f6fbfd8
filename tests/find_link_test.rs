//! Linking behaviour on realistic article text.

use find_link::api::InMemoryWiki;
use find_link::markup::{parse_cite_or_short_description, parse_links, section_iter};
use find_link::{LinkError, find_link_in_content, find_link_in_text};

fn link(q: &str, content: &str, linkto: Option<&str>) -> Result<(String, String), LinkError> {
    find_link_in_content(&InMemoryWiki::new(), q, content, linkto).map(|f| (f.content, f.replacement))
}

const ARTICLE: &str = "{{Short description|Example article}}\n\
'''Example''' is a page about things.<ref>{{cite web|title=Things}}</ref>\n\
== History ==\n\
Early [[history]] of [[File:Map.png|thumb|A map]] things.\n\
=== Later ===\n\
<!-- == Not a heading == -->\n\
Later on.\n\
== See also ==\n\
* [[Other things]]\n";

#[test]
fn test_tokenizers_reproduce_input() {
    let sections = section_iter(ARTICLE);
    let joined: String = sections
        .iter()
        .map(|s| format!("{}{}", s.heading.unwrap_or_default(), s.body))
        .collect();
    assert_eq!(joined, ARTICLE);
    assert_eq!(sections.len(), 4);

    let links: String = parse_links(ARTICLE).iter().map(|t| t.as_str()).collect();
    assert_eq!(links, ARTICLE);

    let cites: String = parse_cite_or_short_description(ARTICLE)
        .iter()
        .map(|t| t.as_str())
        .collect();
    assert_eq!(cites, ARTICLE);
}

#[test]
fn test_no_match_leaves_nothing() {
    assert!(matches!(
        link("standing desk", ARTICLE, None),
        Err(LinkError::NoMatch)
    ));
}

#[test]
fn test_case_preservation() {
    let (content, replacement) =
        link("test phrase", "Able to find this test phrase in an article.", None).expect("linked");
    assert_eq!(content, "Able to find this [[test phrase]] in an article.");
    assert_eq!(replacement, "test phrase");
}

#[test]
fn test_dash_and_space_tolerance() {
    let content = "Two factor authentication is a 'strong authentication' method as it";
    let (content, replacement) = link("two-factor authentication", content, None).expect("linked");
    assert_eq!(replacement, "Two-factor authentication");
    assert_eq!(
        content,
        "[[Two-factor authentication]] is a 'strong authentication' method as it"
    );
}

#[test]
fn test_piped_link_via_linkto() {
    let content = "Ticket barriers control access to all platforms, although the pedestrian footbridge";
    let (content, replacement) = link("ticket barriers", content, Some("turnstile")).expect("linked");
    assert_eq!(replacement, "Turnstile|Ticket barriers");
    assert_eq!(
        content,
        "[[Turnstile|Ticket barriers]] control access to all platforms, although the pedestrian footbridge"
    );
}

#[test]
fn test_bad_link_raises_link_replace() {
    let content = "[[Intelligent design]] is an [[Teleological argument|argument for the existence of God]],";
    assert!(matches!(
        link("existence of God", content, None),
        Err(LinkError::LinkReplace)
    ));
}

#[test]
fn test_citation_excluded() {
    let content = "Some text.<ref>{{cite web|title=Test phrase}}</ref>\n";
    assert!(matches!(link("test phrase", content, None), Err(LinkError::NoMatch)));
}

#[test]
fn test_short_description_excluded() {
    let content = "{{Short description|Test phrase}}\nA test phrase.";
    let (content, _) = link("test phrase", content, None).expect("linked");
    assert_eq!(content, "{{Short description|Test phrase}}\nA [[test phrase]].");
}

#[test]
fn test_heading_excluded() {
    let content = "Lead.\n=== Test phrase ===\nThis is a test phrase.\n";
    let (content, _) = link("test phrase", content, None).expect("linked");
    assert_eq!(content, "Lead.\n=== Test phrase ===\nThis is a [[test phrase]].\n");
}

#[test]
fn test_existing_link_relinked_to_phrase() {
    let wiki = InMemoryWiki::new().with_redirect("Boilerplate (computing)", "Boilerplate code");
    let content = "It removes [[Boilerplate (computing)|boilerplate code]] from programs.";
    let found = find_link_in_content(&wiki, "boilerplate code", content, None).expect("linked");
    assert_eq!(found.content, "It removes [[boilerplate code]] from programs.");
}

#[test]
fn test_en_dash_phrase() {
    let content = "characterised by obsessive-compulsive disorder symptoms";
    let (content, replacement) =
        link("obsessive\u{2013}compulsive disorder", content, None).expect("linked");
    assert_eq!(replacement, "obsessive\u{2013}compulsive disorder");
    assert!(content.contains("[[obsessive\u{2013}compulsive disorder]]"));
}

#[test]
fn test_plain_mention_before_longer_link() {
    let sample = "It compiles Python programs into intermediate bytecode, which is executed by the virtual machine. \
        Jython compiles into Java byte code, which can then be executed by every [[Java Virtual Machine]] implementation. \
        This also enables the use of Java class library functions from the Python program.";
    let expected = sample.replace("virtual machine", "[[virtual machine]]");

    let (content, replacement) = link("virtual machine", sample, None).expect("linked");
    assert_eq!(content, expected);
    assert_eq!(replacement, "virtual machine");

    let found = find_link_in_text(&InMemoryWiki::new(), "virtual machine", sample).expect("linked");
    assert_eq!(found.content, expected);
    assert_eq!(found.replacement, "virtual machine");
}
