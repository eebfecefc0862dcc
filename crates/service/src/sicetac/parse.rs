use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::numeric::parse_locale_float;
use super::SicetacError;

/// One `documento` block lifted out of the response body. Values are already
/// unquoted and numeric fields parsed; derivation happens in the client.
#[derive(Debug, Clone)]
pub(super) struct ParsedQuote {
    pub(super) route_code: Option<String>,
    pub(super) route_name: Option<String>,
    pub(super) unit_type: Option<String>,
    pub(super) cargo_type: Option<String>,
    pub(super) mobilization_value: f64,
    pub(super) ton_value: Option<f64>,
    pub(super) hour_value: Option<f64>,
    pub(super) distance_km: Option<f64>,
}

/// Walks the response XML once. An `ErrorMSG` element anywhere in the tree
/// wins over any tariff data; documents without a parseable `VALOR` are
/// skipped; zero usable documents is reported as an empty result.
pub(super) fn parse_response(body: &str) -> Result<Vec<ParsedQuote>, SicetacError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut quotes = Vec::new();
    let mut error_message: Option<String> = None;
    let mut in_document = false;
    let mut in_error = false;
    let mut current_field: Option<String> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|err| SicetacError::InvalidResponse(err.to_string()))?;
        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                if name.eq_ignore_ascii_case("documento") {
                    in_document = true;
                    fields.clear();
                } else if name.eq_ignore_ascii_case("errormsg") {
                    in_error = true;
                } else if in_document {
                    current_field = Some(name.to_uppercase());
                }
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|err| SicetacError::InvalidResponse(err.to_string()))?;
                record_text(
                    &value,
                    in_error,
                    &current_field,
                    &mut error_message,
                    &mut fields,
                );
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).to_string();
                record_text(
                    &value,
                    in_error,
                    &current_field,
                    &mut error_message,
                    &mut fields,
                );
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_string();
                if name.eq_ignore_ascii_case("documento") {
                    in_document = false;
                    if let Some(quote) = finish_document(&fields) {
                        quotes.push(quote);
                    }
                    fields.clear();
                } else if name.eq_ignore_ascii_case("errormsg") {
                    in_error = false;
                } else {
                    current_field = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(message) = error_message {
        return Err(SicetacError::RemoteService(message));
    }
    if quotes.is_empty() {
        return Err(SicetacError::EmptyResult);
    }
    Ok(quotes)
}

fn record_text(
    value: &str,
    in_error: bool,
    current_field: &Option<String>,
    error_message: &mut Option<String>,
    fields: &mut HashMap<String, String>,
) {
    let value = clean_value(value);
    if value.is_empty() {
        return;
    }
    if in_error {
        *error_message = Some(match error_message.take() {
            Some(existing) => format!("{existing} {value}"),
            None => value,
        });
    } else if let Some(field) = current_field {
        fields
            .entry(field.clone())
            .and_modify(|existing| {
                existing.push(' ');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
}

fn finish_document(fields: &HashMap<String, String>) -> Option<ParsedQuote> {
    let mobilization_value = fields.get("VALOR").and_then(|v| parse_locale_float(v))?;
    Some(ParsedQuote {
        route_code: fields.get("RUTA").cloned(),
        route_name: fields.get("NOMBRERUTA").cloned(),
        unit_type: fields.get("NOMBREUNIDADTRANSPORTE").cloned(),
        cargo_type: fields.get("NOMBRETIPOCARGA").cloned(),
        mobilization_value,
        ton_value: fields.get("VALORTONELADA").and_then(|v| parse_locale_float(v)),
        hour_value: fields.get("VALORHORA").and_then(|v| parse_locale_float(v)),
        distance_km: fields.get("DISTANCIA").and_then(|v| parse_locale_float(v)),
    })
}

/// Field values arrive wrapped in apostrophes the way they were quoted on
/// the request side.
fn clean_value(value: &str) -> String {
    value.trim().trim_matches('\'').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{parse_response, SicetacError};

    fn document(route: &str, valor: &str, valorhora: &str) -> String {
        format!(
            "<documento>\
             <RUTA>'{route}'</RUTA>\
             <NOMBRERUTA>'BOGOTA - MEDELLIN'</NOMBRERUTA>\
             <NOMBREUNIDADTRANSPORTE>'ESTACAS'</NOMBREUNIDADTRANSPORTE>\
             <NOMBRETIPOCARGA>'GENERAL'</NOMBRETIPOCARGA>\
             <VALOR>'{valor}'</VALOR>\
             <VALORTONELADA>'85000'</VALORTONELADA>\
             <VALORHORA>'{valorhora}'</VALORHORA>\
             <DISTANCIA>'415'</DISTANCIA>\
             </documento>"
        )
    }

    fn wrap(inner: &str) -> String {
        format!("<?xml version='1.0' encoding='ISO-8859-1' ?><root>{inner}</root>")
    }

    #[test]
    fn parses_documents_in_response_order() {
        let body = wrap(&format!(
            "{}{}",
            document("11001000-05001000", "2.450.000", "35000"),
            document("11001000-76001000", "3,100,000.50", "40000")
        ));
        let quotes = parse_response(&body).expect("parse");
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].route_code.as_deref(), Some("11001000-05001000"));
        assert_eq!(quotes[0].mobilization_value, 2_450_000.0);
        assert_eq!(quotes[0].hour_value, Some(35_000.0));
        assert_eq!(quotes[0].route_name.as_deref(), Some("BOGOTA - MEDELLIN"));
        assert_eq!(quotes[1].mobilization_value, 3_100_000.50);
    }

    #[test]
    fn documents_without_a_parseable_value_are_skipped() {
        let body = wrap(&format!(
            "{}{}",
            document("A", "", ""),
            document("B", "1.000.000", "")
        ));
        let quotes = parse_response(&body).expect("parse");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].route_code.as_deref(), Some("B"));
        assert_eq!(quotes[0].hour_value, None);
    }

    #[test]
    fn error_marker_wins_over_document_data() {
        let body = wrap(&format!(
            "<ErrorMSG>Documento no encontrado</ErrorMSG>{}",
            document("A", "1000", "10")
        ));
        match parse_response(&body) {
            Err(SicetacError::RemoteService(message)) => {
                assert_eq!(message, "Documento no encontrado");
            }
            other => panic!("expected remote service error, got {other:?}"),
        }
    }

    #[test]
    fn no_usable_documents_is_an_empty_result() {
        let body = wrap("<documento><VALOR>''</VALOR></documento>");
        assert!(matches!(parse_response(&body), Err(SicetacError::EmptyResult)));
        let body = wrap("");
        assert!(matches!(parse_response(&body), Err(SicetacError::EmptyResult)));
    }

    #[test]
    fn malformed_markup_is_an_invalid_response() {
        let body = "<root><documento><VALOR>1000</documento></root>";
        assert!(matches!(
            parse_response(body),
            Err(SicetacError::InvalidResponse(_))
        ));
    }
}
