use connexon_leads::fetch::EntrezClient;
use connexon_leads::{PmidLookup, PmidLookupFailed};
use std::fs::{self, File};
use std::io::BufRead;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> EntrezClient {
    EntrezClient::new(server.uri(), 5, None, None)
}

#[tokio::test]
async fn test_esearch_returns_first_pmid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("retmax", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": {
                "count": "1",
                "idlist": ["25430711"]
            }
        })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .esearch("Engineered Small Diameter Arterial Grafts")
        .await;

    assert_eq!(result.unwrap(), Some("25430711".to_string()));
}

#[tokio::test]
async fn test_esearch_no_results_returns_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": {
                "count": "0",
                "idlist": []
            }
        })))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).esearch("No Such Paper").await;

    assert_eq!(result.unwrap(), None);
}

#[tokio::test]
async fn test_esearch_server_error_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).esearch("Some Title").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_efetch_returns_xml_body() {
    let mock_server = MockServer::start().await;
    let xml = "<PubmedArticleSet></PubmedArticleSet>";

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("retmode", "xml"))
        .and(query_param("id", "25430711,25453935"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .mount(&mock_server)
        .await;

    let pmids = vec!["25430711".to_string(), "25453935".to_string()];
    let body = client_for(&mock_server).efetch(&pmids).await.unwrap();

    assert_eq!(body, xml);
}

#[tokio::test]
async fn test_fetch_run_records_hits_and_misses() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&input_dir).unwrap();

    let titles = vec!["Matched Paper", "Unmatched Paper"];
    serde_json::to_writer(
        File::create(input_dir.join("publication_titles.json")).unwrap(),
        &titles,
    )
    .unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("term", "Matched Paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": { "idlist": ["25430711"] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("term", "Unmatched Paper"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": { "idlist": [] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("id", "25430711"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<PubmedArticleSet></PubmedArticleSet>"),
        )
        .mount(&mock_server)
        .await;

    let args = connexon_leads::fetch::FetchArgs {
        input: input_dir,
        output: output_dir.clone(),
        base_url: mock_server.uri(),
        email: None,
        api_key: None,
        timeout: 5,
        fallback_pmid: None,
    };
    connexon_leads::fetch::run_async(args).await.unwrap();

    let lookups: Vec<PmidLookup> = std::io::BufReader::new(
        File::open(output_dir.join("pmid_lookups.jsonl")).unwrap(),
    )
    .lines()
    .filter_map(|l| l.ok())
    .filter_map(|l| serde_json::from_str(&l).ok())
    .collect();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].title, "Matched Paper");
    assert_eq!(lookups[0].pmid, "25430711");

    let failed: Vec<PmidLookupFailed> = std::io::BufReader::new(
        File::open(output_dir.join("pmid_lookups.failed.jsonl")).unwrap(),
    )
    .lines()
    .filter_map(|l| l.ok())
    .filter_map(|l| serde_json::from_str(&l).ok())
    .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].title, "Unmatched Paper");
    assert_eq!(failed[0].error, "No match found");

    let xml = fs::read_to_string(output_dir.join("pubmed_records.xml")).unwrap();
    assert_eq!(xml, "<PubmedArticleSet></PubmedArticleSet>");
}

#[tokio::test]
async fn test_fetch_run_substitutes_fallback_pmid_when_asked() {
    let temp_dir = TempDir::new().unwrap();
    let input_dir = temp_dir.path().join("input");
    let output_dir = temp_dir.path().join("output");
    fs::create_dir_all(&input_dir).unwrap();

    serde_json::to_writer(
        File::create(input_dir.join("publication_titles.json")).unwrap(),
        &vec!["Unmatched Paper"],
    )
    .unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "esearchresult": { "idlist": [] }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("id", "25430711"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<PubmedArticleSet/>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let args = connexon_leads::fetch::FetchArgs {
        input: input_dir,
        output: output_dir.clone(),
        base_url: mock_server.uri(),
        email: None,
        api_key: None,
        timeout: 5,
        fallback_pmid: Some("25430711".to_string()),
    };
    connexon_leads::fetch::run_async(args).await.unwrap();

    let lookups: Vec<PmidLookup> = std::io::BufReader::new(
        File::open(output_dir.join("pmid_lookups.jsonl")).unwrap(),
    )
    .lines()
    .filter_map(|l| l.ok())
    .filter_map(|l| serde_json::from_str(&l).ok())
    .collect();
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].pmid, "25430711");

    // The miss is still recorded even though the fallback was substituted.
    let failed_content =
        fs::read_to_string(output_dir.join("pmid_lookups.failed.jsonl")).unwrap();
    assert!(failed_content.contains("Unmatched Paper"));
}
