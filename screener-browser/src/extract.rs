//! Numeric extraction from rendered HTML documents.
//!
//! Pages publish figures with thousands separators and stray whitespace
//! ("1,234.50"), either as cell text or as attribute values. These helpers
//! normalise both forms. They never fail; a missing element or an
//! unparseable value yields `None` so callers can report every absent
//! field at once.

use scraper::{ElementRef, Html, Selector};

/// Parse a figure, ignoring thousands separators and whitespace.
///
/// Non-finite results (`NaN`, `inf`) are treated as absent.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read the number held in a table cell.
///
/// Cells usually wrap the figure in a child element, sometimes followed by
/// a label (`<span>1,234.50</span><small>EMA</small>`). The first child
/// element's text is read first; a cell without one, or whose first child
/// holds no number, falls back to the cell's whole text.
pub fn extract_numeric_cell(element: ElementRef<'_>) -> Option<f64> {
    element
        .children()
        .find_map(ElementRef::wrap)
        .and_then(|child| parse_number(&child.text().collect::<String>()))
        .or_else(|| parse_number(&element.text().collect::<String>()))
}

/// Read the number held in an element attribute.
pub fn extract_numeric_attribute(element: ElementRef<'_>, attribute: &str) -> Option<f64> {
    element.value().attr(attribute).and_then(parse_number)
}

/// Find the first element matching a CSS selector.
///
/// An invalid selector is reported as no match.
pub fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        <table><tbody>
          <tr><td class="ma10">
                <span>1,234.50</span>
              </td>
              <td class="empty"><span>--</span></td>
              <td class="labelled"><span>1,234.50</span><small>EMA</small></td>
              <td class="bare">987.25</td></tr>
          <tr data-marker="52wkHigh" data-value="2,001.75"><td>52 Week High</td></tr>
          <tr data-marker="broken" data-value="n/a"></tr>
        </tbody></table>
    "#;

    #[test]
    fn test_parse_number_strips_separators() {
        assert_eq!(parse_number("1,234.50"), Some(1234.5));
        assert_eq!(parse_number("  42 "), Some(42.0));
        assert_eq!(parse_number("12 345"), Some(12345.0));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("--"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_extract_numeric_cell_reads_nested_text() {
        let document = Html::parse_document(TABLE);
        let cell = select_first(&document, "td.ma10").unwrap();
        assert_eq!(extract_numeric_cell(cell), Some(1234.5));

        let empty = select_first(&document, "td.empty").unwrap();
        assert_eq!(extract_numeric_cell(empty), None);
    }

    #[test]
    fn test_extract_numeric_cell_ignores_trailing_label() {
        let document = Html::parse_document(TABLE);
        let cell = select_first(&document, "td.labelled").unwrap();
        assert_eq!(extract_numeric_cell(cell), Some(1234.5));
    }

    #[test]
    fn test_extract_numeric_cell_without_child_uses_cell_text() {
        let document = Html::parse_document(TABLE);
        let cell = select_first(&document, "td.bare").unwrap();
        assert_eq!(extract_numeric_cell(cell), Some(987.25));
    }

    #[test]
    fn test_extract_numeric_attribute() {
        let document = Html::parse_document(TABLE);
        let row = select_first(&document, r#"tr[data-marker="52wkHigh"]"#).unwrap();
        assert_eq!(extract_numeric_attribute(row, "data-value"), Some(2001.75));
        assert_eq!(extract_numeric_attribute(row, "data-missing"), None);

        let broken = select_first(&document, r#"tr[data-marker="broken"]"#).unwrap();
        assert_eq!(extract_numeric_attribute(broken, "data-value"), None);
    }

    #[test]
    fn test_select_first_with_invalid_selector() {
        let document = Html::parse_document(TABLE);
        assert!(select_first(&document, "td[").is_none());
        assert!(select_first(&document, "td.ma200").is_none());
    }
}
