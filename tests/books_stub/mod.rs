use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

/// Local stand-in for the books catalogue.
///
/// - pages 1 and 2 list four books, page 3 answers 404
/// - `broken_3` answers 500 on its detail page
/// - page 7 answers 503 once, then lists one book; page 8 answers 404
/// - page 20 always answers 500
/// - page 30 lists one good book and one unresolvable link; page 31 answers 404
/// - page 40 lists a fieldless maintenance page and one good book
/// - page `i64::MAX` lists one book
pub struct BooksStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl BooksStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start books stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            let mut hits: HashMap<String, usize> = HashMap::new();
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                log.lock().expect("lock request log").push(path.clone());
                let seen = hits.entry(path.clone()).or_insert(0);
                let previous_hits = *seen;
                *seen += 1;

                let (status, body) = route(&path, previous_hits);
                let mut response = tiny_http::Response::from_string(body).with_status_code(status);
                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"text/html; charset=utf-8"[..],
                )
                .expect("build header");
                response = response.with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock request log").clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| *p == path).count()
    }
}

impl Drop for BooksStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn route(path: &str, previous_hits: usize) -> (u16, String) {
    match path {
        "/catalogue/page-1.html" => (
            200,
            catalogue_page(&[
                "book-one_1/index.html",
                "../catalogue/book-two_2/index.html",
                "broken_3/index.html",
            ]),
        ),
        "/catalogue/page-2.html" => (200, catalogue_page(&["book-four_4/index.html"])),
        "/catalogue/page-7.html" if previous_hits == 0 => (503, "try later".to_owned()),
        "/catalogue/page-7.html" => (200, catalogue_page(&["book-seven_7/index.html"])),
        "/catalogue/page-20.html" => (500, "server error".to_owned()),
        "/catalogue/page-30.html" => (
            200,
            catalogue_page(&["book-one_1/index.html", "http://[/index.html"]),
        ),
        "/catalogue/page-40.html" => (
            200,
            catalogue_page(&["maintenance_9/index.html", "book-four_4/index.html"]),
        ),
        "/catalogue/page-9223372036854775807.html" => {
            (200, catalogue_page(&["book-four_4/index.html"]))
        }
        "/catalogue/maintenance_9/index.html" => (
            200,
            "<html><body>maintenance</body></html>".to_owned(),
        ),
        "/catalogue/book-one_1/index.html" => {
            (200, book_page("Book One", "upc-0001", "Three"))
        }
        "/catalogue/book-two_2/index.html" => (200, book_page("Book Two", "upc-0002", "Five")),
        "/catalogue/book-four_4/index.html" => (200, book_page("Book Four", "upc-0004", "One")),
        "/catalogue/book-seven_7/index.html" => {
            (200, book_page("Book Seven", "upc-0007", "Eleven"))
        }
        "/catalogue/broken_3/index.html" => (500, "server error".to_owned()),
        _ => (404, "not found".to_owned()),
    }
}

pub fn catalogue_page(links: &[&str]) -> String {
    let articles = links
        .iter()
        .map(|href| {
            format!(
                r#"<li><article class="product_pod">
  <div class="image_container"><a href="{href}"><img src="x.jpg" alt="x"></a></div>
  <p class="star-rating Two"></p>
  <h3><a href="{href}" title="book">book</a></h3>
</article></li>"#
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html><head><title>All products</title></head>
<body><section><ol class="row">
{articles}
</ol></section></body></html>
"#
    )
}

pub fn book_page(title: &str, upc: &str, rating_word: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>{title}</title></head>
<body>
<div class="product_main">
  <h1>{title}</h1>
  <p class="price_color">£10.00</p>
  <p class="star-rating {rating_word}"><i class="icon-star"></i></p>
</div>
<div id="product_description" class="sub-header"><h2>Product Description</h2></div>
<p>About {title}.</p>
<table class="table table-striped">
  <tr><th>UPC</th><td>{upc}</td></tr>
  <tr><th>Product Type</th><td>Books</td></tr>
</table>
</body></html>
"#
    )
}
