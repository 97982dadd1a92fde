/*!

This is the long-form manual for `roster_ranking` and `rosterdash`.

## Input formats

The following formats are supported:
* `csv` Semicolon-delimited UTF-8 text, as published in the official
  candidate lists.
* `excel` An `.xlsx` workbook with the same logical layout, one header
  row followed by one row per candidate.

### `csv`

The file must start with a header row naming every column. Cells are
separated by `;`. This is the default input type.

### `excel`

The first worksheet is read unless `--excel-worksheet-name` selects
another one. All cells are interpreted as text before typing.

## Roster layouts

Two layouts are recognized, distinguished by their last column:

* the placement layout ends with `STATUS` (`VAGA` for a direct vacancy,
  `CR` for the waiting list);
* the tally layout ends with `ACERTOS` (the raw count of correct
  answers).

All other columns are common: `CARGO`, `LOCALIDADE`, `NOME`,
`INSCRICAO`, `DATA NASC` (as `dd/mm/yyyy`), `CG`, `CE`, `NOTA`,
`NEGRO`, `PCD`. A file whose header matches neither layout is rejected
as a whole.

## Ranking order

Views are ordered by `NOTA` (highest first), then `CE` (highest first),
then `DATA NASC` (oldest first). `NOTA` and `CE` cells that do not parse
as numbers are kept as null and rank below every number. Rows tied on
all three keys keep the relative order they had in the source file.

`POSIÇÃO` is assigned after sorting, 1-based and contiguous, and is
always local to the current filtered view.

## Command line examples

Show the full ranked roster:

```bash
rosterdash --input lista_tce.csv
```

Constrain the view and export it (the export filename embeds a
`YYYYMMDD_HHMMSS` timestamp):

```bash
rosterdash --input lista_tce.csv --cargo "Auditor" --status VAGA --export .
```

List the values every selector can take:

```bash
rosterdash --input lista_tce.csv --list-options
```

Check the current view against a previously exported reference:

```bash
rosterdash --input lista_tce.csv --cargo "Auditor" --reference auditor_ref.csv
```

*/
