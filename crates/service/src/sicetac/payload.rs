use cotizador_core::quote::QuoteRequest;

/// Builds the XML document the RNDC endpoint expects: an access block with
/// the plaintext credentials (the protocol requires them in the body), the
/// fixed tipo=2/procesoid=26 "query tariff" markers, the comma-joined
/// variables block and the route/vehicle criteria. Values are wrapped in
/// apostrophes as the wire format demands.
pub(super) fn build_payload(request: &QuoteRequest, username: &str, password: &str) -> String {
    let variables = request.normalized_variables().join(", ");

    let mut document_lines = vec![
        format!("<PERIODO>'{}'</PERIODO>", xml_escape(request.period.trim())),
        format!(
            "<CONFIGURACION>'{}'</CONFIGURACION>",
            xml_escape(&request.configuration.trim().to_uppercase())
        ),
        format!("<ORIGEN>'{}'</ORIGEN>", xml_escape(request.origin.trim())),
        format!("<DESTINO>'{}'</DESTINO>", xml_escape(request.destination.trim())),
    ];
    if let Some(unit_type) = non_empty_upper(request.unit_type.as_deref()) {
        document_lines.push(format!(
            "<NOMBREUNIDADTRANSPORTE>'{}'</NOMBREUNIDADTRANSPORTE>",
            xml_escape(&unit_type)
        ));
    }
    if let Some(cargo_type) = non_empty_upper(request.cargo_type.as_deref()) {
        document_lines.push(format!(
            "<NOMBRETIPOCARGA>'{}'</NOMBRETIPOCARGA>",
            xml_escape(&cargo_type)
        ));
    }
    let document_section = document_lines.join("\n    ");

    format!(
        "<?xml version='1.0' encoding='ISO-8859-1' ?>\n\
         <root>\n\
         \x20 <acceso>\n\
         \x20   <username>{username}</username>\n\
         \x20   <password>{password}</password>\n\
         \x20 </acceso>\n\
         \x20 <solicitud>\n\
         \x20   <tipo>2</tipo>\n\
         \x20   <procesoid>26</procesoid>\n\
         \x20 </solicitud>\n\
         \x20 <variables>\n\
         \x20   {variables}\n\
         \x20 </variables>\n\
         \x20 <documento>\n\
         \x20   {document_section}\n\
         \x20 </documento>\n\
         </root>\n",
        username = xml_escape(username),
        password = xml_escape(password),
    )
}

fn non_empty_upper(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty())
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::build_payload;
    use cotizador_core::quote::QuoteRequest;

    fn request() -> QuoteRequest {
        QuoteRequest {
            period: "202401".to_string(),
            configuration: "3s3".to_string(),
            origin: "11001000".to_string(),
            destination: "05001000".to_string(),
            cargo_type: None,
            unit_type: None,
            logistics_hours: 0.0,
            variables: None,
        }
    }

    #[test]
    fn payload_carries_access_and_fixed_process_markers() {
        let payload = build_payload(&request(), "rndc-user", "secret");
        assert!(payload.contains("<username>rndc-user</username>"));
        assert!(payload.contains("<password>secret</password>"));
        assert!(payload.contains("<tipo>2</tipo>"));
        assert!(payload.contains("<procesoid>26</procesoid>"));
        assert!(payload.starts_with("<?xml version='1.0' encoding='ISO-8859-1' ?>"));
    }

    #[test]
    fn default_variables_are_comma_joined() {
        let payload = build_payload(&request(), "u", "p");
        assert!(payload.contains(
            "RUTA, NOMBREUNIDADTRANSPORTE, NOMBRETIPOCARGA, NOMBRERUTA, VALOR, VALORTONELADA, VALORHORA, DISTANCIA"
        ));
    }

    #[test]
    fn supplied_variables_are_upper_cased_and_filtered() {
        let mut request = request();
        request.variables = Some(vec![" valor ".to_string(), "".to_string(), "ruta".to_string()]);
        let payload = build_payload(&request, "u", "p");
        assert!(payload.contains("VALOR, RUTA"));
        assert!(!payload.contains("VALOR, , RUTA"));
    }

    #[test]
    fn criteria_values_are_apostrophe_quoted_and_upper_cased() {
        let mut request = request();
        request.unit_type = Some("estacas".to_string());
        request.cargo_type = Some("carga refrigerada".to_string());
        let payload = build_payload(&request, "u", "p");
        assert!(payload.contains("<PERIODO>'202401'</PERIODO>"));
        assert!(payload.contains("<CONFIGURACION>'3S3'</CONFIGURACION>"));
        assert!(payload.contains("<NOMBREUNIDADTRANSPORTE>'ESTACAS'</NOMBREUNIDADTRANSPORTE>"));
        assert!(payload.contains("<NOMBRETIPOCARGA>'CARGA REFRIGERADA'</NOMBRETIPOCARGA>"));
    }

    #[test]
    fn optional_criteria_are_omitted_when_absent() {
        // The variable list still names these fields; only the criteria
        // elements must be absent.
        let payload = build_payload(&request(), "u", "p");
        assert!(!payload.contains("<NOMBREUNIDADTRANSPORTE>"));
        assert!(!payload.contains("<NOMBRETIPOCARGA>"));
    }

    #[test]
    fn markup_characters_in_values_are_escaped() {
        let mut request = request();
        request.cargo_type = Some("a<b&c".to_string());
        let payload = build_payload(&request, "u", "p");
        assert!(payload.contains("'A&lt;B&amp;C'"));
    }
}
