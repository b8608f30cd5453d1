//! Custom list and mapping editors, rendered with leptos into the `ul`
//! the page provides and serialized back into their hidden inputs.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;
use quickstart_wizard::editors::{
    LIST_PREFIXES, ListEditor, ListEditorIds, MAPPING_PREFIXES, MappingEditor, MappingEditorIds,
};
use quickstart_wizard::{StatusMessage, WizardConfig};
use tracing::debug;
use web_sys::HtmlElement;

use crate::dom::{self, by_id, listen_id, query_all, set_value, value_of};
use crate::pages::libraries;

#[component]
fn EditorItems(items: RwSignal<Vec<String>>, on_remove: Callback<usize>) -> impl IntoView {
    view! {
        <For
            each={move || items.get().into_iter().enumerate().collect::<Vec<_>>()}
            key={|(idx, label)| format!("{idx}:{label}")}
            children=move |(idx, label)| {
                view! {
                    <li class="list-group-item d-flex justify-content-between align-items-center">
                        <span>{label}</span>
                        <button
                            type="button"
                            class="btn btn-sm btn-outline-danger"
                            on:click=move |_| on_remove.call(idx)
                        >
                            <i class="fas fa-times"></i>
                        </button>
                    </li>
                }
            }
        />
    }
}

fn mount_items(list_id: &str, items: RwSignal<Vec<String>>, on_remove: Callback<usize>) {
    let Some(list) = by_id::<HtmlElement>(list_id) else {
        return;
    };
    list.set_inner_html("");
    mount_to(list, move || view! { <EditorItems items=items on_remove=on_remove /> });
}

fn reject(err: &quickstart_wizard::WizardError) {
    dom::toast(&StatusMessage::warning(err.to_string()));
}

fn bind_list(config: Rc<WizardConfig>, ids: ListEditorIds) {
    let editor = Rc::new(RefCell::new(ListEditor::load(
        &ids.hidden,
        &value_of(&ids.hidden).unwrap_or_default(),
    )));
    let items = create_rw_signal(editor.borrow().items().to_vec());

    let commit = {
        let editor = editor.clone();
        let hidden = ids.hidden.clone();
        let config = config.clone();
        move || {
            let editor = editor.borrow();
            set_value(&hidden, &editor.serialize());
            items.set(editor.items().to_vec());
            libraries::refresh(&config);
        }
    };

    let on_remove = {
        let editor = editor.clone();
        let commit = commit.clone();
        Callback::new(move |idx: usize| {
            let removed = editor.borrow_mut().remove(idx);
            if removed.is_some() {
                commit();
            }
        })
    };
    mount_items(&ids.list, items, on_remove);

    let input_id = ids.input.clone();
    listen_id(&ids.add_button, "click", move |event| {
        event.prevent_default();
        let added = editor
            .borrow_mut()
            .add(&value_of(&input_id).unwrap_or_default());
        match added {
            Ok(()) => {
                set_value(&input_id, "");
                commit();
            }
            Err(err) => reject(&err),
        }
    });
}

fn bind_mapping(config: Rc<WizardConfig>, ids: MappingEditorIds) {
    let editor = Rc::new(RefCell::new(MappingEditor::load(
        &ids.hidden,
        &value_of(&ids.hidden).unwrap_or_default(),
    )));
    let labels = |editor: &MappingEditor| -> Vec<String> {
        editor
            .entries()
            .iter()
            .map(|(key, value)| MappingEditor::display(key, value.as_deref()))
            .collect()
    };
    let items = create_rw_signal(labels(&editor.borrow()));

    let commit = {
        let editor = editor.clone();
        let hidden = ids.hidden.clone();
        move || {
            let editor = editor.borrow();
            set_value(&hidden, &editor.serialize());
            items.set(labels(&editor));
            libraries::refresh(&config);
        }
    };

    let on_remove = {
        let editor = editor.clone();
        let commit = commit.clone();
        Callback::new(move |idx: usize| {
            let key = editor
                .borrow()
                .entries()
                .get(idx)
                .map(|(key, _)| key.clone());
            if let Some(key) = key {
                editor.borrow_mut().remove(&key);
                commit();
            }
        })
    };
    mount_items(&ids.list, items, on_remove);

    let (input_id, output_id) = (ids.input.clone(), ids.output.clone());
    listen_id(&ids.add_button, "click", move |event| {
        event.prevent_default();
        let added = editor.borrow_mut().add(
            &value_of(&input_id).unwrap_or_default(),
            &value_of(&output_id).unwrap_or_default(),
        );
        match added {
            Ok(()) => {
                set_value(&input_id, "");
                set_value(&output_id, "");
                commit();
            }
            Err(err) => reject(&err),
        }
    });
}

pub fn init(config: Rc<WizardConfig>) {
    let mut bound = 0;
    for hidden in query_all("input[type='hidden'][id$='_custom_hidden']") {
        let id = hidden.id();
        let Some(stem) = id.strip_suffix("_custom_hidden") else {
            continue;
        };
        let Some((library_id, prefix)) = LIST_PREFIXES.iter().find_map(|prefix| {
            stem.strip_suffix(&format!("-{prefix}"))
                .map(|library_id| (library_id, *prefix))
        }) else {
            continue;
        };
        bind_list(config.clone(), ListEditorIds::new(library_id, prefix));
        bound += 1;
    }
    for hidden in query_all("input[type='hidden'][id*='-attribute_'][id$='_hidden']") {
        let id = hidden.id();
        let Some(library_id) = MappingEditorIds::library_id(&id) else {
            continue;
        };
        let Some(prefix) = MAPPING_PREFIXES
            .iter()
            .find(|prefix| id.ends_with(&format!("-attribute_{prefix}_hidden")))
        else {
            continue;
        };
        bind_mapping(config.clone(), MappingEditorIds::new(library_id, prefix));
        bound += 1;
    }
    debug!("{bound} list editors bound");
}
