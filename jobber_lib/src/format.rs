//! Slack message rendering for new postings.

use std::fmt::Write;

use crate::types::Posting;

const DESCRIPTION_INDENT: &str = "      ";
const NO_DESCRIPTION: &str = "No description provided.";
const NO_SKILLS: &str = "None";
const SEPARATOR: &str = "*--------------------------------------------------------*";

/// Renders a posting as Slack mrkdwn.
///
/// Output is sent verbatim, one `\n`-terminated line per template line.
/// Description lines are split on `\r` and `\n`, empty pieces dropped.
pub fn slack_message(posting: &Posting) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "<!channel>");
    let _ = writeln!(
        out,
        ":sparkles: *Title:* *<{}|{}>*",
        posting.url, posting.title
    );
    let _ = writeln!(out);

    let _ = writeln!(out, ":memo: *Description:*");
    if posting.description.trim().is_empty() {
        let _ = writeln!(out, "{}{}", DESCRIPTION_INDENT, NO_DESCRIPTION);
    } else {
        for line in posting
            .description
            .split(['\r', '\n'])
            .filter(|line| !line.is_empty())
        {
            let _ = writeln!(out, "{}{}", DESCRIPTION_INDENT, line);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, ":hourglass_flowing_sand: *Duration:* {}", posting.duration);
    let skills = if posting.skills.is_empty() {
        NO_SKILLS.to_string()
    } else {
        posting.skills.join(", ")
    };
    let _ = writeln!(out, ":hammer_and_wrench: *Skills:* {}", skills);
    let _ = writeln!(
        out,
        ":money_with_wings: *Lead Payment Type:* {}",
        posting.payment_type
    );
    let _ = writeln!(out, ":dollar: *Payment Amount:* {}", posting.price);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", SEPARATOR);

    out
}
