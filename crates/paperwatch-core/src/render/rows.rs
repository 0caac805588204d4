use crate::models::PaperRecord;

use super::math::pretty_math;

pub(super) const TABLE_HEADER: &str = "|Date|Title|Paper|Code|Abstract|\n\
|---|---|---|---|--------------------------------------------------|\n";

/// `|**date**|**title**|[id](url)|**[link](code)**|**abstract**|`
pub(super) fn table_row(record: &PaperRecord) -> String {
    let code = match &record.code_url {
        Some(url) => format!("**[link]({url})**"),
        None => "null".to_string(),
    };
    format!(
        "|**{}**|**{}**|[{}]({})|{}|**{}**|\n",
        record.update_date,
        escape_cell(&pretty_math(&record.title)),
        record.canonical_id,
        record.source_url,
        code,
        escape_cell(&pretty_math(&record.abstract_text)),
    )
}

/// `- date, **title**, Paper: [url](url), Code: **[url](url)**, Abstract: text`
pub(super) fn list_item(record: &PaperRecord) -> String {
    let mut line = format!(
        "- {}, **{}**, Paper: [{}]({})",
        record.update_date,
        flatten(&pretty_math(&record.title)),
        record.source_url,
        record.source_url,
    );
    if let Some(url) = &record.code_url {
        line.push_str(&format!(", Code: **[{url}]({url})**"));
    }
    line.push_str(&format!(", Abstract: {}\n", flatten(&pretty_math(&record.abstract_text))));
    line
}

fn flatten(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_cell(s: &str) -> String {
    flatten(s).replace('|', "\\|")
}
