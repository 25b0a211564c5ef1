use crate::object::{HostObject, ObjectClass};
use crate::template::BaseTemplate;
use crate::value::HostValue;

/// Builds a representative global environment object.
///
/// The graph contains self references (`window`, `self`, `globalThis`), a
/// two-node cycle through `document.defaultView`, a `timing` object shared by
/// two parents, a storage area, functions, arrays, non-finite numbers, and
/// members whose names shadow base template members.
pub fn demo_global(template: &BaseTemplate) -> HostObject {
	let plain = || template.instantiate(ObjectClass::Plain);
	let function = |name: &str| template.instantiate(ObjectClass::Function { name: name.to_string() });

	let window = plain();
	window.set("window", &window);
	window.set("self", &window);
	window.set("globalThis", &window);

	let body = plain();
	body.set("tagName", "BODY");
	body.set("childNodes", HostObject::array(Some(template.object().clone()), []));

	let document = plain();
	document.set("title", "shapeshot");
	document.set("defaultView", &window);
	document.set("body", body);
	document.set("getElementById", function("getElementById"));
	window.set("document", document);

	let timing = plain();
	timing.set("navigationStart", 1_700_000_000_000.0);
	timing.set("loadEventEnd", 0);

	let navigator = plain();
	navigator.set("userAgent", "Mozilla/5.0 (shapeshot)");
	navigator.set("languages", HostObject::array(Some(template.object().clone()), ["en-US".into(), "en".into()]));
	navigator.set("onLine", true);
	navigator.set("timing", &timing);
	window.set("navigator", navigator);

	let performance = plain();
	performance.set("timing", &timing);
	performance.set("now", function("now"));
	window.set("performance", performance);

	let storage = HostObject::with_prototype(ObjectClass::Storage, Some(template.object().clone()));
	storage.set("theme", "dark");
	storage.set("visits", 12);
	window.set("localStorage", storage);

	let location = plain();
	location.set("href", "https://example.test/");
	location.set("port", "");
	window.set("location", location);

	let config = plain();
	config.set("constructor", "custom");
	config.set("toString", "shadowed");
	config.set("retries", 3);
	config.set("ratio", f64::NAN);
	config.set("limit", f64::INFINITY);
	window.set("config", config);

	window.set("alert", function("alert"));
	window.set("undefinedSlot", HostValue::Undefined);
	window.set("nothing", HostValue::Null);
	window.set("iterator", HostValue::Symbol(Some("Symbol.iterator".to_string())));

	window
}
